//! Shared helpers for unit tests.

use crate::grid::DataPlane;

/// Initialize tracing for tests. Safe to call multiple times.
/// Respects `RUST_LOG` env var, defaults to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Build a single-slice field from rows given top-down, the way a grid is
/// usually drawn. `rows[0]` becomes `y = ny - 1`.
pub fn field_from_rows(rows: &[&[f64]]) -> DataPlane {
    let ny = rows.len();
    let nx = rows.first().map_or(0, |r| r.len());
    let mut field = DataPlane::new(nx, ny, 1);
    for (row_idx, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), nx, "ragged rows");
        let y = ny - 1 - row_idx;
        for (x, &v) in row.iter().enumerate() {
            field.put(v, x, y, 0);
        }
    }
    field
}

/// Single-slice field of `value` inside the inclusive rectangles, zero elsewhere.
pub fn field_with_blocks(
    nx: usize,
    ny: usize,
    blocks: &[(usize, usize, usize, usize)],
    value: f64,
) -> DataPlane {
    let mut field = DataPlane::new(nx, ny, 1);
    for &(x0, y0, x1, y1) in blocks {
        for y in y0..=y1 {
            for x in x0..=x1 {
                field.put(value, x, y, 0);
            }
        }
    }
    field
}

/// Stack single-slice fields into one field with `slices.len()` time slices.
pub fn stack_slices(slices: &[DataPlane]) -> DataPlane {
    let first = &slices[0];
    let mut field = DataPlane::new(first.nx(), first.ny(), slices.len());
    for (t, slice) in slices.iter().enumerate() {
        field.put_t_slice(slice, t);
    }
    field
}
