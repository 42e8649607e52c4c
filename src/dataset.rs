use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::types::SplitData;

/// Number of items assigned to the training split.
pub fn train_count(len: usize, ratio: f64) -> usize {
    (len as f64 * ratio).floor() as usize
}

/// Shuffle `items` with a seeded RNG and cut the result into train and val.
///
/// The first `floor(len * ratio)` shuffled items form the training split and
/// the rest the validation split, so the partition depends only on the
/// input order, the seed and the ratio.
pub fn split_annotations<T: Clone>(items: &[T], ratio: f64, seed: u64) -> SplitData<T> {
    let mut shuffled = items.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let split_index = train_count(shuffled.len(), ratio).min(shuffled.len());
    let val = shuffled.split_off(split_index);

    SplitData {
        train: shuffled,
        val,
    }
}
