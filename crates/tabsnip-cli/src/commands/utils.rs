use anyhow::{bail, Context, Result};
use tabsnip_core::geometry::SelectionRect;

/// Parses a selection given as `X,Y,WxH`, e.g. `50,50,200x150`.
pub fn parse_rect(s: &str) -> Result<SelectionRect> {
    let parts: Vec<&str> = s.split(',').collect();
    let [x, y, size] = parts.as_slice() else {
        bail!("expected X,Y,WxH (e.g. 50,50,200x150), got '{s}'");
    };
    let (width, height) = size
        .split_once('x')
        .with_context(|| format!("expected WxH in '{size}'"))?;

    Ok(SelectionRect::new(
        x.trim().parse().with_context(|| format!("bad x '{x}'"))?,
        y.trim().parse().with_context(|| format!("bad y '{y}'"))?,
        width
            .trim()
            .parse()
            .with_context(|| format!("bad width '{width}'"))?,
        height
            .trim()
            .parse()
            .with_context(|| format!("bad height '{height}'"))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rect() {
        let rect = parse_rect("50,50,200x150").unwrap();
        assert_eq!(rect, SelectionRect::new(50, 50, 200, 150));
    }

    #[test]
    fn test_parse_rect_tolerates_spaces() {
        let rect = parse_rect("10, 20, 30x40").unwrap();
        assert_eq!(rect, SelectionRect::new(10, 20, 30, 40));
    }

    #[test]
    fn test_parse_rect_rejects_garbage() {
        assert!(parse_rect("50,50").is_err());
        assert!(parse_rect("a,b,cxd").is_err());
        assert!(parse_rect("50,50,200").is_err());
    }
}
