// Every source of randomness is owned by the caller and handed down by `&mut`, there is no
// thread local generator to reach for.

use rand::{SeedableRng, rngs::StdRng};

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
