/// Computes the arithmetic mean over the present values. Returns `None` when
/// every value is missing.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Most frequent present value. Ties go to the value encountered first.
pub fn mode<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    // (value, count) in first-seen order
    let mut tallies: Vec<(&str, usize)> = Vec::new();
    for value in values.into_iter().flatten() {
        match tallies.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => tallies.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in tallies {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// First present value, in input order.
pub fn first<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    values.into_iter().flatten().next().map(str::to_string)
}

/// Percentage of `true` values; 0.0 for empty input.
pub fn percent_true<I>(flags: I) -> f64
where
    I: IntoIterator<Item = bool>,
{
    let (hits, total) = flags
        .into_iter()
        .fold((0usize, 0usize), |(hits, total), f| (hits + f as usize, total + 1));

    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
