use edit_distance::edit_distance;

type Result<T> = std::result::Result<T, String>;

/// Names from `expected` within an edit distance of two of `input`,
/// closest first.
pub fn generate_suggestion(input: &str, expected: &[String]) -> Result<Vec<String>> {
    let mut closest = expected
        .iter()
        .filter_map(|candidate| {
            let distance = edit_distance(input, candidate);
            if distance == 0 {
                return Some(Err(format!(
                    "Unexpected edit distance of 0 found with input: {input} and expected: {expected:?}"
                )));
            }
            if distance <= 2 {
                Some(Ok((distance, candidate)))
            } else {
                None
            }
        })
        .collect::<Result<Vec<_>>>()?;

    closest.sort_by(|(a, _), (b, _)| a.cmp(b));

    Ok(closest.into_iter().map(|(_, s)| s.clone()).collect())
}
