use std::io::{self, Write};

use tabwriter::TabWriter;

use crate::view::ViewState;

/// Write `view` as an aligned text table followed by the KPI line.
///
/// An error replaces the quote list, as the board shows it.
pub fn write_table<W: Write>(out: W, view: &ViewState) -> io::Result<()> {
    let mut tw = TabWriter::new(out);
    if let Some(err) = &view.error {
        writeln!(tw, "error: {}", err)?;
        return tw.flush();
    }
    writeln!(tw, "PRODUCT\tPRICE\tCURRENCY\tDELIVERY")?;
    for q in &view.quotes {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}",
            q.product,
            q.display_price(),
            q.currency,
            q.delivery
        )?;
    }
    writeln!(
        tw,
        "\naverage: {:.2}\tactive: {}",
        view.kpis.average_price, view.kpis.active_count
    )?;
    if let Some(ts) = view.last_refresh {
        writeln!(tw, "updated: {}", ts.format("%Y-%m-%d %H:%M:%S"))?;
    }
    tw.flush()
}

/// Render into a `String`; see [`write_table`].
pub fn to_table(view: &ViewState) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_table(&mut buf, view);
    String::from_utf8_lossy(&buf).into_owned()
}
