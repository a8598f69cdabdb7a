//! HTML and javascript snippets around a plotly.js figure.
//!
//! Templates use `{plot_id}`, `{format}`, `{height}`, `{width}` and
//! `{filename}` placeholders, filled by [`fill_placeholders`].

use crate::error::{FigureError, FigureResult};

use super::ShowOptions;

pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
pub const PLOTLY_LOCAL_PATH: &str = "plotly.min.js";
pub const CLIPBOARD_CDN_URL: &str = "https://cdn.jsdelivr.net/npm/clipboard@2/dist/clipboard.min.js";
pub const CLIPBOARD_LOCAL_PATH: &str = "clipboard.min.js";

const DOWNLOAD_FUNCTION: &str = r#"<script>
  function download_plotly_image(plot_id, format, height, width, filename)
  {
    let p = document.getElementById(plot_id);
    window._Plotly.downloadImage(
      p,
      {
        format: format,
        height: height,
        width: width,
        filename: filename
      });
  };
</script>
"#;

// drag rectangles of sub-axes are covered so only the main axes react
const HIDE_DRAGGABLE_FUNCTION: &str = r#"<script>
  function hide_draggable_elements(plot_id)
  {
    let p = document.getElementById(plot_id);
    let svg = p.querySelector("svg.main-svg");
    let svgNS = svg.namespaceURI;
    let hidelayer = document.createElementNS(svgNS, "g");
    hidelayer.setAttribute("class", "hidelayer");
    [...p.querySelectorAll("g.draglayer > g")].forEach((item) =>
      {
        if (6 < item.getAttribute("class").length)
        {
          [...item.querySelectorAll("rect.drag")].forEach((item) =>
            {
              let rect = document.createElementNS(svgNS, "rect");
              for (let key of ["style", "x", "y", "width", "height"])
              {
                rect.setAttribute(key, item.getAttribute(key));
              }
              hidelayer.appendChild(rect);
            });
        }
      });
    svg.appendChild(hidelayer);
  };
</script>
"#;

// autoscale ignores the layered tick axes
const REMOVE_AUTOSCALE_FUNCTION: &str = r#"<script>
  function remove_autoscale_button(plot_id)
  {
    [...document.getElementById(plot_id).querySelectorAll("a.modebar-btn")]
      .forEach((item) =>
        {
          if (item.getAttribute("data-title") == "Autoscale")
          {
            item.parentNode.removeChild(item);
          }
        });
  };
</script>
"#;

const SHIFT_XTITLE_FUNCTION: &str = r#"<script>
  function shift_subplots_xtitle(plot_id, xtitle_index)
  {
    let p = document.getElementById(plot_id);
    let xtitle = [...p.querySelectorAll("g.infolayer > g")]
      .filter((g) => g.className.baseVal == "annotation")[xtitle_index]
      .querySelector("g.cursor-pointer");
    let t = xtitle.getAttribute("transform");
    let ytrans_old = parseFloat(t.slice(t.indexOf(",")+1, t.indexOf(")")));
    let h_rect = parseFloat(xtitle.querySelector("rect").getAttribute("height"));
    let ytrans_new = p.layout.height - h_rect;
    xtitle.setAttribute("transform",
      t.slice(0,t.indexOf(",")+1) + ytrans_new.toString() + ")");
    p.layout.annotations[xtitle_index].yshift = ytrans_old - ytrans_new;
  };
</script>
"#;

const SHIFT_YTITLE_FUNCTION: &str = r#"<script>
  function shift_subplots_ytitle(plot_id, ytitle_index)
  {
    let p = document.getElementById(plot_id);
    let annotation = [...p.querySelectorAll("g.infolayer > g")]
      .filter((g) => g.className.baseVal == "annotation")[ytitle_index];
    let ytitle_parent = annotation.querySelector("g.annotation-text-g");
    let ytitle = annotation.querySelector("g.cursor-pointer");
    let r = ytitle_parent.getAttribute("transform");
    let t = ytitle.getAttribute("transform");
    let xtrans_old = parseFloat(t.slice(t.indexOf("(")+1, t.indexOf(",")));
    let rect = ytitle.querySelector("rect");
    let xcenter = 0.5*parseFloat(rect.getAttribute("width"))
                  + parseFloat(rect.getAttribute("x"));
    let ycenter = 0.5*parseFloat(rect.getAttribute("height"))
                  - parseFloat(rect.getAttribute("y"));
    let xtrans_new = ycenter - xcenter;
    ytitle.setAttribute("transform",
      t.slice(0,t.indexOf("(")+1) + xtrans_new.toString() + t.slice(t.indexOf(",")));
    ytitle_parent.setAttribute("transform",
      r.slice(0,r.indexOf(",")+1) + (xtrans_new+xcenter).toString() + r.slice(r.lastIndexOf(",")));
    p.layout.annotations[ytitle_index].xshift = xtrans_new - xtrans_old;
  };
</script>
"#;

const CLIPBOARD_STYLE: &str = r#"<style>
  .btn-clipboard {
    padding: 0px;
  }
</style>
"#;

const CLIPBOARD_INIT: &str = r#"<script>
  if (!window._ClipboardJS && window.ClipboardJS)
  {
    window._ClipboardJS = window.ClipboardJS;
  }
  if (window._ClipboardJS)
  {
    new window._ClipboardJS(".btn-clipboard");
  }
</script>
"#;

/// Default plotly.js download script, run once the page has loaded.
const PLAIN_DOWNLOAD_SCRIPT: &str = r#"<script>
  function downloadimage(format, height, width, filename)
  {
    let p = document.getElementById("{plot_id}");
    window._Plotly.downloadImage(p, {format: format, height: height, width: width, filename: filename});
  };
  if (document.readyState == "complete")
  {
    downloadimage("{format}", {height}, {width}, "{filename}");
  }
  else
  {
    window.addEventListener("load", () => downloadimage("{format}", {height}, {width}, "{filename}"));
  }
</script>
"#;

const DOWNLOAD_BUTTON: &str = r#"<button onclick="download_plotly_image('{plot_id}', '{format}', {height}, {width}, '{filename}')">
  Download Image as <span style="text-transform:uppercase;">{format}</span>
</button>
"#;

fn on_load_script(body: &str) -> String {
    format!(
        r#"<script>
  if (document.readyState == "complete")
  {{
    {body}
  }}
  else
  {{
    window.addEventListener("load", () =>
    {{
      {body}
    }});
  }}
</script>
"#
    )
}

/// Loads plotly.js (from the CDN when `connected`, otherwise from a local
/// `plotly.min.js`) and defines the helper functions used by the overlay
/// scripts and the style reference lists.
#[must_use]
pub fn init_plotly(connected: bool) -> String {
    let (plotly_src, clipboard_src) = if connected {
        (PLOTLY_CDN_URL, CLIPBOARD_CDN_URL)
    } else {
        (PLOTLY_LOCAL_PATH, CLIPBOARD_LOCAL_PATH)
    };

    let mut html = String::new();
    html.push_str(&format!(
        "<script src=\"{plotly_src}\" charset=\"utf-8\"></script>\n"
    ));
    html.push_str("<script>\n  window._Plotly = Plotly;\n</script>\n");
    for snippet in [
        DOWNLOAD_FUNCTION,
        HIDE_DRAGGABLE_FUNCTION,
        REMOVE_AUTOSCALE_FUNCTION,
        SHIFT_XTITLE_FUNCTION,
        SHIFT_YTITLE_FUNCTION,
        CLIPBOARD_STYLE,
    ] {
        html.push_str(snippet);
    }
    html.push_str(&format!("<script src=\"{clipboard_src}\"></script>\n"));
    html.push_str(CLIPBOARD_INIT);
    html
}

/// Image download script for `caller`.
///
/// `"plot"` gives the plain script that downloads the image on load;
/// `"iplot"` gives a download button plus the overlay scripts that hide
/// sub-axis drag handles and shift single subplot titles (annotations at
/// `xtitle_index` / `ytitle_index`).
pub fn image_download_script(
    caller: &str,
    xtitle_index: Option<usize>,
    ytitle_index: Option<usize>,
) -> FigureResult<String> {
    match caller {
        "plot" => Ok(PLAIN_DOWNLOAD_SCRIPT.to_owned()),
        "iplot" => {
            let mut html = DOWNLOAD_BUTTON.to_owned();
            html.push_str(&on_load_script(
                "hide_draggable_elements(\"{plot_id}\");\n    remove_autoscale_button(\"{plot_id}\");",
            ));
            if let Some(index) = xtitle_index {
                html.push_str(&on_load_script(&format!(
                    "shift_subplots_xtitle(\"{{plot_id}}\", {index});"
                )));
            }
            if let Some(index) = ytitle_index {
                html.push_str(&on_load_script(&format!(
                    "shift_subplots_ytitle(\"{{plot_id}}\", {index});"
                )));
            }
            Ok(html)
        }
        other => Err(FigureError::InvalidData(format!(
            "caller should only be one of `iplot` or `plot`, got `{other}`"
        ))),
    }
}

/// Replaces template placeholders with `plot_id` and the image options.
#[must_use]
pub fn fill_placeholders(template: &str, plot_id: &str, options: &ShowOptions) -> String {
    template
        .replace("{plot_id}", plot_id)
        .replace("{format}", options.image.as_str())
        .replace("{height}", &options.image_height.to_string())
        .replace("{width}", &options.image_width.to_string())
        .replace("{filename}", &options.filename)
}

#[cfg(test)]
mod tests {
    use super::{fill_placeholders, image_download_script, init_plotly};
    use crate::render::ShowOptions;

    #[test]
    fn init_defines_helpers_and_picks_source() {
        let offline = init_plotly(false);
        assert!(offline.contains("src=\"plotly.min.js\""));
        for name in [
            "function download_plotly_image",
            "function hide_draggable_elements",
            "function remove_autoscale_button",
            "function shift_subplots_xtitle",
            "function shift_subplots_ytitle",
        ] {
            assert!(offline.contains(name), "missing {name}");
        }
        assert!(init_plotly(true).contains("cdn.plot.ly"));
    }

    #[test]
    fn iplot_script_includes_title_shifts_only_when_indexed() {
        let plain = image_download_script("iplot", None, None).expect("script");
        assert!(plain.contains("<button"));
        assert!(!plain.contains("shift_subplots_xtitle"));

        let shifted = image_download_script("iplot", Some(2), Some(3)).expect("script");
        assert!(shifted.contains("shift_subplots_xtitle(\"{plot_id}\", 2);"));
        assert!(shifted.contains("shift_subplots_ytitle(\"{plot_id}\", 3);"));
    }

    #[test]
    fn unknown_caller_is_rejected() {
        assert!(image_download_script("show", None, None).is_err());
        assert!(!image_download_script("plot", None, None).expect("plot").contains("<button"));
    }

    #[test]
    fn placeholders_are_filled() {
        let options = ShowOptions::for_size(300, 200).with_filename("out");
        let filled = fill_placeholders(
            &image_download_script("iplot", None, None).expect("script"),
            "fig-1",
            &options,
        );
        assert!(filled.contains("download_plotly_image('fig-1', 'svg', 200, 300, 'out')"));
        assert!(!filled.contains("{plot_id}"));
    }
}
