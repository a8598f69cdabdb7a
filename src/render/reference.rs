//! Clipboard-enabled lists of valid Plotly style names.

const BASE_MARKER_SYMBOLS: [&str; 45] = [
    "circle",
    "square",
    "diamond",
    "cross",
    "x",
    "triangle-up",
    "triangle-down",
    "triangle-left",
    "triangle-right",
    "triangle-ne",
    "triangle-se",
    "triangle-sw",
    "triangle-nw",
    "pentagon",
    "hexagon",
    "hexagon2",
    "octagon",
    "star",
    "hexagram",
    "star-triangle-up",
    "star-triangle-down",
    "star-square",
    "star-diamond",
    "diamond-tall",
    "diamond-wide",
    "hourglass",
    "bowtie",
    "circle-cross",
    "circle-x",
    "square-cross",
    "square-x",
    "diamond-cross",
    "diamond-x",
    "cross-thin",
    "x-thin",
    "asterisk",
    "hash",
    "y-up",
    "y-down",
    "y-left",
    "y-right",
    "line-ew",
    "line-ns",
    "line-ne",
    "line-nw",
];

const MARKER_SYMBOL_VARIANTS: [&str; 4] = ["", "-open", "-dot", "-open-dot"];

pub const LINE_DASHES: [&str; 6] = ["solid", "dot", "dash", "longdash", "dashdot", "longdashdot"];

/// Every value of `scatter.marker.symbol`, variants next to their base symbol.
#[must_use]
pub fn scatter_marker_symbols() -> Vec<String> {
    BASE_MARKER_SYMBOLS
        .iter()
        .flat_map(|base| {
            MARKER_SYMBOL_VARIANTS
                .iter()
                .map(move |variant| format!("{base}{variant}"))
        })
        .collect()
}

fn clipboard_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let mut html = String::from("<ul>\n");
    for item in items {
        html.push_str(&format!(
            "  <li><text class=\"btn btn-clipboard\" data-clipboard-text=\"{item}\">{item}</text></li>\n"
        ));
    }
    html.push_str("</ul>\n");
    html
}

/// Marker symbols starting with `start` and ending with `end`.
#[must_use]
pub fn ref_scatter_marker_symbol(start: &str, end: &str) -> String {
    let symbols = scatter_marker_symbols();
    clipboard_list(
        symbols
            .iter()
            .map(String::as_str)
            .filter(|symbol| symbol.starts_with(start) && symbol.ends_with(end)),
    )
}

#[must_use]
pub fn ref_scatter_line_dash() -> String {
    clipboard_list(LINE_DASHES)
}

#[cfg(test)]
mod tests {
    use super::{ref_scatter_line_dash, ref_scatter_marker_symbol, scatter_marker_symbols};

    #[test]
    fn symbols_carry_all_variants() {
        let symbols = scatter_marker_symbols();
        assert_eq!(symbols.len(), 180);
        assert_eq!(symbols[1], "circle-open");
        assert_eq!(symbols[3], "circle-open-dot");
    }

    #[test]
    fn marker_list_is_filtered_by_prefix_and_suffix() {
        let html = ref_scatter_marker_symbol("triangle", "open");
        assert_eq!(html.matches("<li>").count(), 8);
        assert!(html.contains("data-clipboard-text=\"triangle-up-open\""));
        assert!(!html.contains("triangle-up-open-dot"));
    }

    #[test]
    fn dash_list_has_every_dash() {
        assert_eq!(ref_scatter_line_dash().matches("<li>").count(), 6);
    }
}
