use crate::discretization::grid::Grid;
use crate::numerics::trajectory::Trajectory;
use crate::physics::field::ElectricField;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write data to CSV file with headers
pub fn write_csv<P: AsRef<Path>>(path: P, headers: &[&str], data: &[Vec<f64>]) -> io::Result<()> {
    if !headers.is_empty() && !data.is_empty() && headers.len() != data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Headers count ({}) doesn't match data columns ({})",
                headers.len(),
                data.len()
            ),
        ));
    }

    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "{}", headers.join(","))?;

    let n_rows = data.iter().map(|col| col.len()).max().unwrap_or(0);

    for i in 0..n_rows {
        let row: Vec<String> = data
            .iter()
            .map(|col| {
                if i < col.len() {
                    format!("{:.15e}", col[i])
                } else {
                    String::new()
                }
            })
            .collect();
        writeln!(file, "{}", row.join(","))?;
    }

    file.flush()
}

/// Write x-y data pairs
pub fn write_xy<P: AsRef<Path>>(
    path: P,
    x_header: &str,
    y_header: &str,
    x_data: &[f64],
    y_data: &[f64],
) -> io::Result<()> {
    if x_data.len() != y_data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "X and Y data lengths don't match ({} vs {})",
                x_data.len(),
                y_data.len()
            ),
        ));
    }
    write_csv(
        path,
        &[x_header, y_header],
        &[x_data.to_vec(), y_data.to_vec()],
    )
}

/// Cell coordinates in mm, row-major (x fastest).
fn cell_coordinates(ny: usize, nx: usize, scale: f64) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(ny * nx);
    let mut ys = Vec::with_capacity(ny * nx);
    for row in 0..ny {
        for col in 0..nx {
            xs.push(col as f64 / scale);
            ys.push(row as f64 / scale);
        }
    }
    (xs, ys)
}

fn row_major(grid: &Grid) -> Vec<f64> {
    let (ny, nx) = grid.shape();
    (0..ny)
        .flat_map(|row| (0..nx).map(move |col| grid[(row, col)]))
        .collect()
}

/// One line per cell: `x_mm,y_mm,phi`.
pub fn write_grid<P: AsRef<Path>>(path: P, grid: &Grid, scale: f64) -> io::Result<()> {
    let (ny, nx) = grid.shape();
    let (xs, ys) = cell_coordinates(ny, nx, scale);
    write_csv(path, &["x_mm", "y_mm", "phi"], &[xs, ys, row_major(grid)])
}

/// One line per cell: `x_mm,y_mm,ex,ey`.
pub fn write_field<P: AsRef<Path>>(path: P, field: &ElectricField, scale: f64) -> io::Result<()> {
    let (ny, nx) = field.shape();
    let (xs, ys) = cell_coordinates(ny, nx, scale);
    write_csv(
        path,
        &["x_mm", "y_mm", "ex", "ey"],
        &[xs, ys, row_major(&field.ex), row_major(&field.ey)],
    )
}

/// Positions in cells and mm, velocities as integrated.
pub fn write_trajectory<P: AsRef<Path>>(
    path: P,
    trajectory: &Trajectory,
    scale: f64,
) -> io::Result<()> {
    let steps: Vec<f64> = (0..trajectory.positions.len()).map(|i| i as f64).collect();
    let x: Vec<f64> = trajectory.positions.iter().map(|p| p.x).collect();
    let y: Vec<f64> = trajectory.positions.iter().map(|p| p.y).collect();
    let vx = trajectory.velocities.iter().map(|v| v.x).collect();
    let vy = trajectory.velocities.iter().map(|v| v.y).collect();
    let x_mm = x.iter().map(|v| v / scale).collect();
    let y_mm = y.iter().map(|v| v / scale).collect();
    write_csv(
        path,
        &["step", "x", "y", "vx", "vy", "x_mm", "y_mm"],
        &[steps, x, y, vx, vy, x_mm, y_mm],
    )
}

/// Max-norm change per relaxation iteration, 1-based.
pub fn write_history<P: AsRef<Path>>(path: P, history: &[f64]) -> io::Result<()> {
    let iterations: Vec<f64> = (1..=history.len()).map(|i| i as f64).collect();
    write_xy(path, "iteration", "delta", &iterations, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pmt_sim_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_write_csv() {
        let path = temp_path("plain.csv");
        let headers = &["x", "y", "z"];
        let data = vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ];

        write_csv(&path, headers, &data).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("x,y,z"));
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn header_mismatch_is_rejected() {
        let err = write_csv(temp_path("bad.csv"), &["a"], &[vec![1.0], vec![2.0]]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn grid_is_written_row_major_in_mm() {
        let path = temp_path("grid.csv");
        let grid = Grid::from_fn(2, 3, |row, col| (10 * row + col) as f64);
        write_grid(&path, &grid, 10.0).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "x_mm,y_mm,phi");
        assert_eq!(lines.len(), 7);
        let fourth: Vec<f64> = lines[4].split(',').map(|v| v.parse().unwrap()).collect();
        // row 1, col 0
        assert_eq!(fourth, vec![0.0, 0.1, 10.0]);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn history_is_numbered_from_one() {
        let path = temp_path("history.csv");
        write_history(&path, &[0.5, 0.25]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let second: Vec<f64> = content
            .lines()
            .nth(2)
            .unwrap()
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(second, vec![2.0, 0.25]);
        fs::remove_file(&path).ok();
    }
}
