use anyhow::Result;
use reinforce_api::{
    builders::reinforce::{PolicyType, ReinforceBuilder},
    init_tracing,
    test_utils::{DecliningRewardEnv, FixedRewardEnv, TargetActionEnv, snapshot_params},
};
use reinforce_candle::policies::CategoricalPolicy;
use reinforce_core::{Algorithm, config::ReinforceConfig};

fn quiet_builder() -> ReinforceBuilder {
    init_tracing();
    let mut builder = ReinforceBuilder::default();
    builder.print_results = false;
    builder.set_policy_type(PolicyType::Mlp {
        hidden_layers: vec![8],
        dropout: 0.,
    });
    builder
}

#[test]
fn terminal_step_is_not_part_of_the_episode() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 1;
    let env = FixedRewardEnv::new(vec![1., 2., 3.]);
    let mut reinforce = builder.build(env, &FixedRewardEnv::description())?;
    let history = reinforce.train()?;
    assert_eq!(history.rewards(), &[6.]);
    assert_eq!(history.actions().len(), 1);
    assert_eq!(history.actions()[0].len(), 3);
    assert_eq!(reinforce.env.steps_taken, 4);
    Ok(())
}

#[test]
fn truncated_episode_is_merged_across_rollouts() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 1;
    builder.max_episode_length = 2;
    let description = FixedRewardEnv::description();

    let env = FixedRewardEnv::new(vec![1., 2., 3., 4.]);
    let history = builder.build(env, &description)?.train()?;
    assert!(history.is_empty());
    assert_eq!(history.rewards().len(), history.actions().len());

    builder.num_episodes = 3;
    let env = FixedRewardEnv::new(vec![1., 2., 3., 4.]);
    let history = builder.build(env, &description)?.train()?;
    assert_eq!(history.rewards(), &[10.]);
    assert_eq!(history.actions()[0].len(), 4);
    Ok(())
}

#[test]
fn inference_run_leaves_parameters_unchanged() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 10;
    builder.train = false;
    let env = FixedRewardEnv::new(vec![1., -1., 2.]);
    let mut reinforce = builder.build(env, &FixedRewardEnv::description())?;
    let before = snapshot_params(reinforce.policy.varmap())?;
    let history = reinforce.train()?;
    let after = snapshot_params(reinforce.policy.varmap())?;
    assert_eq!(history.len(), 10);
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn training_updates_parameters() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 10;
    builder.learning_rate = 1e-2;
    let env = FixedRewardEnv::new(vec![1., -1., 2.]);
    let mut reinforce = builder.build(env, &FixedRewardEnv::description())?;
    let before = snapshot_params(reinforce.policy.varmap())?;
    reinforce.train()?;
    let after = snapshot_params(reinforce.policy.varmap())?;
    assert_ne!(before, after);
    Ok(())
}

#[test]
fn early_stopping_cuts_training_short() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 20;
    builder.early_stopping = true;
    builder.early_stopping_frequency = 1;
    let mut reinforce = builder.build_with_validation(
        FixedRewardEnv::new(vec![1., 0.]),
        DecliningRewardEnv::default(),
        &FixedRewardEnv::description(),
    )?;
    let history = reinforce.train()?;
    assert!(history.len() < 20);
    assert_eq!(history.len(), 2);
    assert_eq!(reinforce.validation_rewards(), &[100., 99.]);
    Ok(())
}

#[test]
fn recurrent_policy_trains() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 5;
    builder.recurrent = true;
    builder.learning_rate = 1e-2;
    builder.set_policy_type(PolicyType::Gru { hidden_size: 8 });
    let env = TargetActionEnv::new(1, 3, 6);
    let description = env.description();
    let mut reinforce = builder.build(env, &description)?;
    let before = snapshot_params(reinforce.policy.varmap())?;
    let history = reinforce.train()?;
    let after = snapshot_params(reinforce.policy.varmap())?;
    assert_eq!(history.len(), 5);
    assert!(history.actions().iter().all(|actions| actions.len() == 6));
    assert_ne!(before, after);
    Ok(())
}

#[test]
fn clipped_gradients_still_train() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 5;
    builder.max_grad_norm = Some(0.5);
    let env = TargetActionEnv::new(0, 2, 4);
    let description = env.description();
    let mut reinforce = builder.build(env, &description)?;
    let before = snapshot_params(reinforce.policy.varmap())?;
    reinforce.train()?;
    assert_ne!(before, snapshot_params(reinforce.policy.varmap())?);
    Ok(())
}

#[test]
fn evaluate_runs_on_a_held_out_env() -> Result<()> {
    let mut builder = quiet_builder();
    builder.num_episodes = 3;
    let mut reinforce = builder.build(
        FixedRewardEnv::new(vec![1.]),
        &FixedRewardEnv::description(),
    )?;
    reinforce.train()?;
    let trained = snapshot_params(reinforce.policy.varmap())?;
    let mut held_out = FixedRewardEnv::new(vec![2., 2.]);
    let history = reinforce.evaluate(&mut held_out, 4)?;
    assert_eq!(history.rewards(), &[4., 4., 4., 4.]);
    assert_eq!(held_out.steps_taken, 12);
    assert_eq!(trained, snapshot_params(reinforce.policy.varmap())?);
    Ok(())
}

#[test]
fn builder_from_json_config() -> Result<()> {
    let config: ReinforceConfig = serde_json::from_str(
        r#"{ "num_episodes": 2, "print_results": false, "seed": 42, "exploration_min": 0.1 }"#,
    )?;
    let builder = ReinforceBuilder::from_config(config);
    assert_eq!(builder.seed, 42);
    let env = FixedRewardEnv::new(vec![0.5, 0.5]);
    let history = builder.build(env, &FixedRewardEnv::description())?.train()?;
    assert_eq!(history.rewards(), &[1., 1.]);
    Ok(())
}
