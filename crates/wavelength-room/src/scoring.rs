//! Round scoring: how close the room's averaged dial landed to the target.

/// Points for a round, by distance between the average dial and the target.
///
/// | distance     | points |
/// |--------------|--------|
/// | `<= 4`       | 4      |
/// | `<= 10`      | 3      |
/// | `<= 18`      | 2      |
/// | further      | 0      |
pub fn points_for(distance: f64) -> u32 {
    if distance <= 4.0 {
        4
    } else if distance <= 10.0 {
        3
    } else if distance <= 18.0 {
        2
    } else {
        0
    }
}

/// Absolute distance between the averaged dial and the target.
pub fn distance(dial: f64, target: u32) -> f64 {
    (dial - f64::from(target)).abs()
}

/// Mean of the given dial positions, or `center` when there are none.
pub fn average<I>(positions: I, center: f64) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = positions
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), pos| (sum + pos, count + 1));
    if count == 0 {
        center
    } else {
        sum / count as f64
    }
}
