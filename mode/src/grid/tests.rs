use super::*;

#[test]
fn test_index_mapping_is_x_fastest() {
    let grid: Grid<u32> = Grid::new(4, 3, 2);
    assert_eq!(grid.index_of(0, 0, 0), 0);
    assert_eq!(grid.index_of(3, 0, 0), 3);
    assert_eq!(grid.index_of(0, 1, 0), 4); // nx
    assert_eq!(grid.index_of(0, 0, 1), 12); // nx * ny
    assert_eq!(grid.index_of(2, 1, 1), 2 + 4 * (1 + 3 * 1));
    assert_eq!(three_to_one(4, 3, 2, 2, 1, 1), grid.index_of(2, 1, 1));
}

#[test]
fn test_get_put() {
    let mut grid: Grid<i32> = Grid::new(3, 3, 1);
    grid.put(7, 2, 1, 0);
    assert_eq!(grid.get(2, 1, 0), 7);
    assert_eq!(grid[(2, 1, 0)], 7);
    assert_eq!(grid[5], 7);
    grid[(0, 2, 0)] = 9;
    assert_eq!(grid.get(0, 2, 0), 9);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_out_of_bounds_panics() {
    let grid: Grid<f64> = Grid::new(3, 3, 1);
    grid.get(3, 0, 0);
}

#[test]
#[should_panic(expected = "data length must equal nx * ny * nt")]
fn test_from_vec_length_mismatch() {
    Grid::from_vec(2, 2, 1, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_set_size_zero_fills() {
    let mut grid = Grid::from_vec(2, 1, 1, vec![5u32, 6]);
    grid.set_size(3, 2, 2);
    assert_eq!(grid.dims(), (3, 2, 2));
    assert_eq!(grid.len(), 12);
    assert!(grid.data().iter().all(|&v| v == 0));
}

#[test]
fn test_clear() {
    let mut grid: Grid<u32> = Grid::new(3, 2, 1);
    grid.clear();
    assert!(grid.is_empty());
    assert_eq!(grid.dims(), (0, 0, 0));
}

#[test]
fn test_clone_is_deep() {
    let mut a: Grid<u32> = Grid::new(2, 2, 1);
    let b = a.clone();
    a.put(1, 0, 0, 0);
    assert_eq!(b.get(0, 0, 0), 0);
    assert_ne!(a, b);
}

#[test]
fn test_data_range_skips_bad_data() {
    let grid = Grid::from_vec(2, 2, 1, vec![BAD_DATA, 3.0, -1.5, BAD_DATA]);
    assert_eq!(grid.data_range(), Some((-1.5, 3.0)));
    assert_eq!(grid.n_valid(), 2);
    assert!(grid.is_bad(0, 0, 0));
    assert!(!grid.is_bad(1, 0, 0));
}

#[test]
fn test_data_range_all_bad() {
    let grid = DataPlane::new_bad(3, 3, 1);
    assert_eq!(grid.data_range(), None);
}

#[test]
fn test_const_t_slice_roundtrip() {
    let data: Vec<u32> = (0..18).collect();
    let mut grid = Grid::from_vec(3, 2, 3, data);
    let slice = grid.const_t_slice(1);
    assert_eq!(slice.dims(), (3, 2, 1));
    assert_eq!(slice.data(), &[6, 7, 8, 9, 10, 11]);

    let zeros: Grid<u32> = Grid::new(3, 2, 1);
    grid.put_t_slice(&zeros, 2);
    assert!(grid.const_t_slice(2).data().iter().all(|&v| v == 0));
    assert_eq!(grid.get(0, 0, 1), 6);
}

#[test]
fn test_same_grid_checks_projection() {
    let proj = LatLonProjection {
        lat_ll: 20.0,
        lon_ll: -130.0,
        delta_lat: 0.5,
        delta_lon: 0.5,
    };
    let a: Grid<f64> = Grid::new(4, 4, 1).with_projection(Some(proj));
    let b: Grid<u32> = Grid::new(4, 4, 1);
    let c: Grid<u32> = Grid::new(4, 4, 1).with_projection(Some(proj));
    assert!(!a.same_grid(&b));
    assert!(a.same_grid(&c));
    assert!(matches!(
        a.check_same_grid(&Grid::<u32>::new(5, 4, 1), "test"),
        Err(Error::DimensionMismatch { .. })
    ));
}

#[test]
fn test_xy_to_latlon() {
    let proj = LatLonProjection {
        lat_ll: 20.0,
        lon_ll: -130.0,
        delta_lat: 0.5,
        delta_lon: 0.25,
    };
    let (lat, lon) = proj.xy_to_latlon(4.0, 2.0);
    assert!((lat - 21.0).abs() < 1e-12);
    assert!((lon - -129.0).abs() < 1e-12);
}
