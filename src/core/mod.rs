pub mod axis_id;
pub mod merge;
pub mod plain_text;
pub mod ticks;
pub mod trace;

pub use axis_id::{AxisDirection, AxisId};
pub use merge::{merge_into, merge_map_into, merged_dict, merged_map};
pub use plain_text::{PerFile, PlainTextColumns, PlainTextSelection, read_plain_text};
pub use ticks::{TickSpec, auto_axis_ticks, linear_tick_interval};
pub use trace::{Trace, TraceKind, make_heatmap, make_scatter};
