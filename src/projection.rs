//! 2-D Projection of Word Vectors
//!
//! Word vectors live in 50 to 300 dimensions. To look at them, the rows are
//! projected onto their two principal directions and drawn as an SVG scatter
//! plot with one label per word.
//!
//! ## Power Iteration
//!
//! ```text
//! X = rows - mean(rows)
//! repeat:  v = Xᵀ (X v);  v = v / ‖v‖        → top principal direction v₁
//! X = X - (X v₁) v₁ᵀ                         (deflate)
//! repeat again                               → second direction v₂
//! points = [X₀ v₁, X₀ v₂]
//! ```
//!
//! The starting vector is drawn from a seeded generator, so the same input
//! always gives the same picture (up to the sign of each axis, which is fixed
//! too).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::embeddings::PretrainedEmbeddings;
use crate::error::{Result, WordbagError};
use crate::tensor::{dot, normalize_in_place, Tensor};

/// Upper bound on the number of words drawn in one plot
pub const MAX_PLOT_POINTS: usize = 1000;

const POWER_ITERATIONS: usize = 200;
const PROJECTION_SEED: u64 = 0;
const CANVAS: f32 = 800.0;
const MARGIN: f32 = 40.0;

/// Project the rows of a `[n, dim]` matrix onto their top two principal
/// directions, giving `[n, 2]`
pub fn pca_2d(vectors: &Tensor) -> Tensor {
    let (n, dim) = (vectors.rows(), vectors.cols());
    if n == 0 || dim == 0 {
        return Tensor::zeros(vec![n, 2]);
    }

    let mut mean = vec![0.0f32; dim];
    for i in 0..n {
        for (m, &v) in mean.iter_mut().zip(vectors.row(i)) {
            *m += v / n as f32;
        }
    }
    let mut centered = vectors.clone();
    for i in 0..n {
        for (v, &m) in centered.row_mut(i).iter_mut().zip(&mean) {
            *v -= m;
        }
    }

    let mut rng = StdRng::seed_from_u64(PROJECTION_SEED);
    let first = principal_direction(&centered, &mut rng);
    let mut deflated = centered.clone();
    for i in 0..n {
        let row = deflated.row_mut(i);
        let score = dot(row, &first);
        for (v, &d) in row.iter_mut().zip(&first) {
            *v -= score * d;
        }
    }
    let second = principal_direction(&deflated, &mut rng);

    let mut points = Vec::with_capacity(n * 2);
    for i in 0..n {
        points.push(dot(centered.row(i), &first));
        points.push(dot(centered.row(i), &second));
    }
    Tensor::new(points, vec![n, 2])
}

/// Dominant eigenvector of `XᵀX` (unit length, zero if `X` is all zeros)
fn principal_direction(x: &Tensor, rng: &mut StdRng) -> Vec<f32> {
    let (n, dim) = (x.rows(), x.cols());
    let mut v: Vec<f32> = (0..dim).map(|_| rng.random::<f32>() - 0.5).collect();
    normalize_in_place(&mut v);

    for _ in 0..POWER_ITERATIONS {
        let mut next = vec![0.0f32; dim];
        for i in 0..n {
            let row = x.row(i);
            let score = dot(row, &v);
            for (nv, &r) in next.iter_mut().zip(row) {
                *nv += score * r;
            }
        }
        normalize_in_place(&mut next);
        let converged = dot(&next, &v).abs() > 1.0 - 1e-7;
        v = next;
        if converged {
            break;
        }
    }

    // Fix the sign so the largest component is positive
    let largest = v
        .iter()
        .copied()
        .fold(0.0f32, |acc, c| if c.abs() > acc.abs() { c } else { acc });
    if largest < 0.0 {
        v.iter_mut().for_each(|c| *c = -*c);
    }
    v
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Write an SVG scatter plot of `[n, 2]` points with one text label each
pub fn write_scatter_svg<P: AsRef<Path>>(
    path: P,
    points: &Tensor,
    labels: &[String],
    title: &str,
) -> Result<()> {
    if points.cols() != 2 || points.rows() != labels.len() {
        return Err(WordbagError::ShapeMismatch(format!(
            "expected [{}, 2] points for {} labels, got {:?}",
            labels.len(),
            labels.len(),
            points.shape
        )));
    }

    let n = points.rows();
    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for i in 0..n {
        let p = points.row(i);
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }
    let span = CANVAS - 2.0 * MARGIN;
    let scale = |v: f32, lo: f32, hi: f32| {
        if hi > lo {
            (v - lo) / (hi - lo) * span
        } else {
            span / 2.0
        }
    };

    let mut svg = BufWriter::new(File::create(path)?);
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{0}" viewBox="0 0 {0} {0}">"#,
        CANVAS
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<text x="{}" y="{}" font-family="sans-serif" font-size="16" text-anchor="middle">{}</text>"#,
        CANVAS / 2.0,
        MARGIN / 2.0 + 6.0,
        escape_xml(title)
    )?;
    for (i, label) in labels.iter().enumerate() {
        let p = points.row(i);
        let x = MARGIN + scale(p[0], min_x, max_x);
        // SVG y grows downward
        let y = CANVAS - MARGIN - scale(p[1], min_y, max_y);
        writeln!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="2" fill="steelblue"/><text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="9">{}</text>"#,
            x,
            y,
            x + 3.0,
            y - 3.0,
            escape_xml(label)
        )?;
    }
    writeln!(svg, "</svg>")?;
    svg.flush()?;
    Ok(())
}

/// Project the first `max_points` words (at most 1000) and save the plot
///
/// Returns the number of words drawn.
pub fn plot_embeddings<P: AsRef<Path>>(
    pretrained: &PretrainedEmbeddings,
    max_points: usize,
    path: P,
) -> Result<usize> {
    let n = max_points.min(MAX_PLOT_POINTS).min(pretrained.len());
    let dim = pretrained.dim();
    let vectors = pretrained.vectors();
    let subset = Tensor::new(vectors.data[..n * dim].to_vec(), vec![n, dim]);

    let points = pca_2d(&subset);
    let labels = pretrained.words()[..n].to_vec();
    let title = format!("{} word vectors ({}-d), first two principal components", n, dim);
    write_scatter_svg(&path, &points, &labels, &title)?;

    log::info!("Plotted {} words to {}", n, path.as_ref().display());
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pca_recovers_dominant_axis() {
        // Points spread along (1, 1, 0), slightly along z
        let rows: Vec<Vec<f32>> = (0..20)
            .map(|i| {
                let t = i as f32 - 10.0;
                vec![t, t, 0.1 * (i % 3) as f32]
            })
            .collect();
        let points = pca_2d(&Tensor::from_rows(&rows));
        assert_eq!(points.shape, vec![20, 2]);
        // Centred t runs from -9.5 to 9.5; the first coordinate is about t * √2
        let first: Vec<f32> = (0..20).map(|i| points.row(i)[0]).collect();
        let second: Vec<f32> = (0..20).map(|i| points.row(i)[1]).collect();
        let spread = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>();
        assert!(spread(&first) > 100.0 * spread(&second));
        assert!((first[19].abs() - 9.5 * 2f32.sqrt()).abs() < 1e-2);
    }

    #[test]
    fn test_pca_is_deterministic() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![0.0, 1.0, 5.0], vec![2.0, 0.0, 1.0]];
        let t = Tensor::from_rows(&rows);
        assert_eq!(pca_2d(&t), pca_2d(&t));
    }

    #[test]
    fn test_svg_escapes_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let points = Tensor::new(vec![0.0, 0.0, 1.0, 1.0], vec![2, 2]);
        let labels = vec!["a<b".to_string(), "at&t".to_string()];
        write_scatter_svg(&path, &points, &labels, "test").unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("a&lt;b"));
        assert!(svg.contains("at&amp;t"));
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn test_label_count_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let points = Tensor::new(vec![0.0, 0.0], vec![1, 2]);
        let result = write_scatter_svg(dir.path().join("x.svg"), &points, &[], "t");
        assert!(matches!(result, Err(WordbagError::ShapeMismatch(_))));
    }
}
