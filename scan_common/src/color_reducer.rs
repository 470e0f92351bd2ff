//! Dominant colors of a blob crop.
//!
//! Pixels are clustered with k-means in RGB, each centroid is named against
//! the palette in [`crate::color_names`], and names are folded into coarse
//! buckets (`blue12` and `blue30` both count as `blue`). The two reported
//! colors are read off the weight-sorted bucket list.

use std::collections::HashMap;

use image::{Rgb, RgbImage};
use kmeans_colors::get_kmeans;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::color_names::{self, Rgb8};
use crate::config::{ColorConfig, ReportOrder};
use crate::error::{Result, ScanError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorCluster {
    /// Mean color of the cluster, channels in `[0, 255]`.
    pub centroid: [f64; 3],
    /// Fraction of the image's pixels assigned to this cluster.
    pub weight: f64,
}

impl ColorCluster {
    pub fn rgb(&self) -> Rgb8 {
        self.centroid.map(|c| c.round().clamp(0.0, 255.0) as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBucket {
    pub name: String,
    pub weight: f64,
}

/// The two colors a target is described by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorReport {
    pub alphanumeric: String,
    pub shape: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorAnalysis {
    pub clusters: Vec<ColorCluster>,
    /// Closest palette name of each cluster, parallel to `clusters`.
    pub names: Vec<String>,
    /// Buckets sorted heaviest first.
    pub buckets: Vec<ColorBucket>,
    pub report: ColorReport,
}

/// Coarse color families, checked in this order. The first match wins, so
/// `orange5` never lands in `red` even though it looks reddish.
pub const FAMILIES: &[(&str, fn(&str) -> bool)] = &[
    ("cream", |n: &str| n.contains("cream")),
    ("blue", |n: &str| n.contains("blue")),
    ("green", |n: &str| n.contains("green")),
    ("red", |n: &str| n.contains("red")),
    ("yellow", |n: &str| n.contains("yellow")),
    ("purple", |n: &str| n.contains("purple")),
    ("gray", |n: &str| n.contains("gray") || n.contains("grey")),
    ("brown", |n: &str| n.contains("brown")),
    ("orange", |n: &str| n.contains("orange")),
    ("pink", |n: &str| n.contains("pink")),
    ("white", |n: &str| n.contains("white")),
    ("violet", |n: &str| n.contains("violet")),
    ("black", |n: &str| n.contains("black")),
];

/// Bucket a palette name belongs to. Names outside every family are their own bucket.
pub fn bucket_for(name: &str) -> &str {
    FAMILIES
        .iter()
        .find(|(_, matches)| matches(name))
        .map_or(name, |&(tag, _)| tag)
}

/// Clusters the pixels of `image` into `config.clusters` groups.
///
/// An image with fewer distinct colors than requested clusters is not an
/// error: every distinct color becomes its own cluster with its exact share.
pub fn cluster_colors(image: &RgbImage, config: &ColorConfig) -> Result<Vec<ColorCluster>> {
    let total = image.width() as usize * image.height() as usize;
    if total == 0 {
        return Err(ScanError::Numeric("no pixels to cluster".to_string()));
    }
    if config.clusters == 0 {
        return Err(ScanError::Numeric("cluster count must be positive".to_string()));
    }

    let mut distinct: Vec<(Rgb8, usize)> = Vec::new();
    let mut slot: HashMap<Rgb8, usize> = HashMap::new();
    for px in image.pixels() {
        let idx = *slot.entry(px.0).or_insert_with(|| {
            distinct.push((px.0, 0));
            distinct.len() - 1
        });
        distinct[idx].1 += 1;
    }

    if distinct.len() < config.clusters {
        log::debug!(
            "{} distinct colors, fewer than {} clusters; clustering exactly",
            distinct.len(),
            config.clusters
        );
        return Ok(distinct
            .into_iter()
            .map(|(rgb, count)| ColorCluster {
                centroid: rgb.map(f64::from),
                weight: count as f64 / total as f64,
            })
            .collect());
    }

    let pixels: Vec<Srgb> = image
        .pixels()
        .map(|p| Srgb::new(p[0], p[1], p[2]).into_format())
        .collect();
    let result = get_kmeans(
        config.clusters,
        config.max_iterations,
        config.convergence,
        false,
        &pixels,
        config.seed,
    );

    let mut counts = vec![0usize; result.centroids.len()];
    for &idx in &result.indices {
        counts[usize::from(idx)] += 1;
    }

    Ok(result
        .centroids
        .iter()
        .zip(counts)
        .map(|(c, count)| ColorCluster {
            centroid: [
                f64::from(c.red) * 255.0,
                f64::from(c.green) * 255.0,
                f64::from(c.blue) * 255.0,
            ],
            weight: count as f64 / total as f64,
        })
        .collect())
}

/// Sums cluster weights per bucket, heaviest first. Equal weights keep the
/// order in which their bucket was first seen.
pub fn reduce_buckets(clusters: &[ColorCluster], names: &[String]) -> Vec<ColorBucket> {
    let mut buckets: Vec<ColorBucket> = Vec::new();
    for (cluster, name) in clusters.iter().zip(names) {
        let bucket = bucket_for(name);
        match buckets.iter_mut().find(|b| b.name == bucket) {
            Some(existing) => existing.weight += cluster.weight,
            None => buckets.push(ColorBucket {
                name: bucket.to_string(),
                weight: cluster.weight,
            }),
        }
    }
    buckets.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    buckets
}

/// Picks the alphanumeric and shape colors from buckets sorted heaviest first.
///
/// With [`ReportOrder::Ascending`] the list is read from its light end and the
/// two lightest buckets are reported. A single bucket answers for both.
pub fn report_colors(buckets: &[ColorBucket], order: ReportOrder) -> Option<ColorReport> {
    let mut ranked: Vec<&ColorBucket> = buckets.iter().collect();
    if order == ReportOrder::Ascending {
        // Stable ascending sort over the first-seen order, not a reversal.
        ranked.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    }
    let first = ranked.first()?;
    let second = ranked.get(1).unwrap_or(first);
    Some(ColorReport {
        alphanumeric: first.name.clone(),
        shape: second.name.clone(),
    })
}

pub fn dominant_colors(image: &RgbImage, config: &ColorConfig) -> Result<ColorAnalysis> {
    let clusters = cluster_colors(image, config)?;
    let names: Vec<String> = clusters
        .iter()
        .map(|cluster| {
            let (actual, closest) = color_names::color_name(cluster.rgb());
            log::debug!(
                "cluster {:?} weight {:.3} -> {} (exact: {:?})",
                cluster.rgb(),
                cluster.weight,
                closest,
                actual
            );
            closest.to_string()
        })
        .collect();

    let buckets = reduce_buckets(&clusters, &names);
    let report = report_colors(&buckets, config.report_order)
        .ok_or_else(|| ScanError::Numeric("no color buckets".to_string()))?;
    log::info!(
        "the color of alphanumeric is {}, the color of the shape is {}",
        report.alphanumeric,
        report.shape
    );

    Ok(ColorAnalysis {
        clusters,
        names,
        buckets,
        report,
    })
}

/// Horizontal bar with one span per cluster, as wide as its weight.
pub fn palette_bar(clusters: &[ColorCluster], width: u32, height: u32) -> RgbImage {
    let mut bar = RgbImage::new(width, height);
    let mut start = 0.0f64;
    for cluster in clusters {
        let end = start + cluster.weight * f64::from(width);
        let (x0, x1) = (start as u32, (end as u32).min(width));
        let color = Rgb(cluster.rgb());
        for x in x0..x1 {
            for y in 0..height {
                bar.put_pixel(x, y, color);
            }
        }
        start = end;
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(w: u32, h: u32, split: u32, left: Rgb8, right: Rgb8) -> RgbImage {
        RgbImage::from_fn(w, h, |x, _| Rgb(if x < split { left } else { right }))
    }

    fn bucket(name: &str, weight: f64) -> ColorBucket {
        ColorBucket {
            name: name.to_string(),
            weight,
        }
    }

    #[test]
    fn family_matching_follows_priority() {
        assert_eq!(bucket_for("blue12"), "blue");
        assert_eq!(bucket_for("cream3"), "cream");
        assert_eq!(bucket_for("orange5"), "orange");
        assert_eq!(bucket_for("mediumvioletred"), "red");
        assert_eq!(bucket_for("slategrey"), "gray");
        assert_eq!(bucket_for("coral"), "coral");
        assert_eq!(bucket_for("indigo"), "indigo");
    }

    #[test]
    fn solid_red_is_one_full_cluster() {
        let image = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let analysis = dominant_colors(&image, &ColorConfig::default()).unwrap();
        let heaviest = analysis
            .clusters
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
            .unwrap();
        assert_eq!(heaviest.rgb(), [255, 0, 0]);
        assert!((heaviest.weight - 1.0).abs() < 1e-9);
        assert!(analysis.buckets[0].name.contains("red"));
    }

    #[test]
    fn all_white_swatch_reports_two_names() {
        let image = RgbImage::from_pixel(300, 50, Rgb([255, 255, 255]));
        let analysis = dominant_colors(&image, &ColorConfig::default()).unwrap();
        assert_eq!(analysis.report.alphanumeric, "white");
        assert_eq!(analysis.report.shape, "white");
    }

    #[test]
    fn kmeans_weights_sum_to_one() {
        // Five well separated colors in equal amounts plus a little noise.
        let palette: [[u8; 3]; 5] = [
            [250, 10, 10],
            [10, 250, 10],
            [10, 10, 250],
            [250, 250, 250],
            [5, 5, 5],
        ];
        let image = RgbImage::from_fn(40, 25, |x, y| {
            let mut c = palette[(x / 8) as usize];
            c[0] = c[0].saturating_add((y % 3) as u8);
            Rgb(c)
        });
        let clusters = cluster_colors(&image, &ColorConfig::default()).unwrap();
        assert_eq!(clusters.len(), 5);
        let total: f64 = clusters.iter().map(|c| c.weight).sum();
        assert!((total - 1.0).abs() < 1e-6);

        let names: Vec<String> = clusters
            .iter()
            .map(|c| color_names::closest_name(c.rgb()).to_string())
            .collect();
        let bucket_total: f64 = reduce_buckets(&clusters, &names)
            .iter()
            .map(|b| b.weight)
            .sum();
        assert!((bucket_total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn exact_clustering_keeps_first_seen_order() {
        let image = two_tone(10, 10, 3, [0, 0, 128], [255, 255, 255]);
        let clusters = cluster_colors(&image, &ColorConfig::default()).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].rgb(), [0, 0, 128]);
        assert!((clusters[0].weight - 0.3).abs() < 1e-9);
        assert!((clusters[1].weight - 0.7).abs() < 1e-9);
    }

    #[test]
    fn ascending_report_reads_lightest_buckets() {
        let buckets = vec![
            bucket("blue", 0.6),
            bucket("white", 0.3),
            bucket("red", 0.1),
        ];
        let asc = report_colors(&buckets, ReportOrder::Ascending).unwrap();
        assert_eq!(
            (asc.alphanumeric.as_str(), asc.shape.as_str()),
            ("red", "white")
        );
        let desc = report_colors(&buckets, ReportOrder::Descending).unwrap();
        assert_eq!(
            (desc.alphanumeric.as_str(), desc.shape.as_str()),
            ("blue", "white")
        );
    }

    #[test]
    fn ties_keep_first_seen_order_both_ways() {
        let buckets = vec![bucket("blue", 0.5), bucket("white", 0.5)];
        let asc = report_colors(&buckets, ReportOrder::Ascending).unwrap();
        assert_eq!(asc.alphanumeric, "blue");
        let desc = report_colors(&buckets, ReportOrder::Descending).unwrap();
        assert_eq!(desc.alphanumeric, "blue");
    }

    #[test]
    fn buckets_merge_family_members() {
        let clusters = vec![
            ColorCluster {
                centroid: [0.0, 0.0, 128.0],
                weight: 0.25,
            },
            ColorCluster {
                centroid: [255.0, 255.0, 255.0],
                weight: 0.5,
            },
            ColorCluster {
                centroid: [65.0, 105.0, 225.0],
                weight: 0.25,
            },
        ];
        let names = vec![
            "blue25".to_string(),
            "white7".to_string(),
            "blue28".to_string(),
        ];
        let buckets = reduce_buckets(&clusters, &names);
        assert_eq!(buckets.len(), 2);
        assert!((buckets[0].weight - 0.5).abs() < 1e-9);
        assert!((buckets[1].weight - 0.5).abs() < 1e-9);
        assert_eq!(buckets[0].name, "blue");
    }

    #[test]
    fn empty_image_is_numeric_error() {
        let err = cluster_colors(&RgbImage::new(0, 0), &ColorConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::Numeric(_)));
    }

    #[test]
    fn palette_bar_spans_follow_weights() {
        let clusters = vec![
            ColorCluster {
                centroid: [255.0, 0.0, 0.0],
                weight: 0.25,
            },
            ColorCluster {
                centroid: [0.0, 0.0, 255.0],
                weight: 0.75,
            },
        ];
        let bar = palette_bar(&clusters, 300, 50);
        assert_eq!(bar.dimensions(), (300, 50));
        assert_eq!(bar.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(bar.get_pixel(74, 49).0, [255, 0, 0]);
        assert_eq!(bar.get_pixel(75, 0).0, [0, 0, 255]);
        assert_eq!(bar.get_pixel(299, 25).0, [0, 0, 255]);
    }
}
