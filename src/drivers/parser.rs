use crate::drivers::ChartError;
/// Maximum number of values taken from one tagged line.
pub const MAX_VALUES: usize = 10;
/// Extracts the integer list of a `#<tag>:v1,v2,...[/trailer]` field.
///
/// Returns `Ok(None)` when the line does not carry the tag at all. The tag is found
/// with a plain substring search, so the first `#<tag>:` anywhere in the line wins,
/// even when it sits inside another field's text.
pub fn parse_line(line: &str, tag: &str) -> Result<Option<Vec<i64>>, ChartError> {
    let marker = format!("#{tag}:");
    let Some(start) = line.find(&marker) else {
        return Ok(None);
    };
    let field = line[start..].split('/').next().unwrap_or_default();
    let (_, payload) = field
        .split_once(':')
        .ok_or_else(|| ChartError::parse(line, "missing ':' after tag"))?;
    let mut values = payload
        .trim()
        .split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|e| ChartError::parse(line, format!("invalid value {token:?}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    values.truncate(MAX_VALUES);
    Ok(Some(values))
}
