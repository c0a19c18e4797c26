//! Terminal rendering of display levels

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render normalized levels as a row of unicode block characters
pub fn render_bars(levels: &[f32]) -> String {
    levels
        .iter()
        .map(|level| {
            let index = (level.clamp(0.0, 1.0) * (BARS.len() - 1) as f32).round() as usize;
            BARS[index.min(BARS.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_char_per_level() {
        let out = render_bars(&[0.0, 0.5, 1.0]);
        assert_eq!(out.chars().count(), 3);
        assert!(out.starts_with('▁'));
        assert!(out.ends_with('█'));
    }

    #[test]
    fn empty_levels() {
        assert_eq!(render_bars(&[]), "");
    }
}
