// src/renderer.rs

use crate::cli::Args;
use crate::loader::CommitMeta;
use chrono::TimeZone;
use git2::Oid;
use git_lanes::{Direction, EdgeType, PrintElement, PrintElementKind, RowType, VisibleGraph};
use image::{Rgb, RgbImage};
use indicatif::{ParallelProgressIterator, ProgressBar};
use palette::{FromColor, Lch, Srgb};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

const BACKGROUND: Rgb<u8> = Rgb([8, 8, 12]);
const HIGHLIGHT: Rgb<u8> = Rgb([255, 255, 255]);
const PALETTE_SEED: u64 = 42;

/// One line per visible row: lane glyphs, arrows, short id, date and summary.
pub fn print_rows(graph: &VisibleGraph<Oid>, meta: &HashMap<Oid, CommitMeta>) {
    let columns = graph.column_count().max(1);
    for row in 0..graph.visible_row_count() {
        let Ok(info) = graph.row_info(row) else { continue };
        let elements = info.print_elements();

        let mut lanes = vec![' '; columns * 2];
        let mut arrows = String::new();
        for element in &elements {
            match element.kind {
                PrintElementKind::Node => {
                    lanes[element.column * 2] = match info.row_type() {
                        RowType::Normal => '*',
                        RowType::Unmatched => 'o',
                    };
                }
                // Only the lower half of an edge is drawn in text
                PrintElementKind::Segment { direction: Direction::Down, other_column } => {
                    let (cell, glyph) = match other_column.cmp(&element.column) {
                        Ordering::Equal => (element.column * 2, '|'),
                        Ordering::Greater => (element.column + other_column, '\\'),
                        Ordering::Less => (element.column + other_column, '/'),
                    };
                    if lanes[cell] == ' ' {
                        lanes[cell] = glyph;
                    }
                }
                PrintElementKind::Segment { .. } => {}
                PrintElementKind::Arrow { direction } => arrows.push(arrow_glyph(direction, element.edge_type)),
            }
        }

        let commit = info.commit();
        let short: String = commit.to_string().chars().take(8).collect();
        let (date, summary) = match meta.get(commit) {
            Some(meta) => (format_time(meta.time), meta.summary.as_str()),
            None => (String::new(), ""),
        };
        let lanes: String = lanes.into_iter().collect();
        println!("{} {:<3} {} {} {}", lanes.trim_end(), arrows, short, date, summary);
    }
}

fn arrow_glyph(direction: Direction, edge_type: Option<EdgeType>) -> char {
    match (direction, edge_type) {
        (Direction::Down, Some(EdgeType::NotLoaded)) => '~',
        (_, Some(EdgeType::Collapsed)) => ':',
        (Direction::Up, _) => '^',
        (Direction::Down, _) => 'v',
    }
}

fn format_time(seconds: i64) -> String {
    chrono::Utc
        .timestamp_opt(seconds, 0)
        .single()
        .map(|time| time.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Draws every row into its own horizontal band of a PNG.
pub fn render_png(graph: &VisibleGraph<Oid>, args: &Args, path: &Path) -> Result<(), image::ImageError> {
    let rows = graph.visible_row_count();
    let lane_width = args.lane_width.max(4);
    let row_height = args.row_height.max(4);
    let width = graph.column_count().max(1) as u32 * lane_width;
    let height = rows as u32 * row_height;

    let bar = ProgressBar::new(rows as u64);
    bar.set_message("Rendering rows");
    let elements: Vec<Vec<PrintElement>> = (0..rows)
        .into_par_iter()
        .progress_with(bar)
        .map(|row| graph.row_info(row).map(|info| info.print_elements()).unwrap_or_default())
        .collect();

    let palette = Palette::new(graph.column_count());
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    let band = (width * row_height * 3) as usize;
    image.par_chunks_mut(band).zip(elements.par_iter()).for_each(|(pixels, row_elements)| {
        let mut canvas = Band { pixels, width, height: row_height };
        for element in row_elements {
            draw_element(&mut canvas, element, lane_width, &palette);
        }
    });

    image.save(path)
}

/// The pixels of one row
struct Band<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl Band<'_> {
    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 3) as usize;
        self.pixels[idx..idx + 3].copy_from_slice(&color.0);
    }

    fn line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb<u8>, dashed: bool) {
        let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).max(1);
        for step in 0..=steps {
            if dashed && (step / 2) % 2 == 1 {
                continue;
            }
            let x = from.0 + (to.0 - from.0) * step / steps;
            let y = from.1 + (to.1 - from.1) * step / steps;
            self.put(x, y, color);
        }
    }

    fn disc(&mut self, center: (i64, i64), radius: i64, color: Rgb<u8>) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put(center.0 + dx, center.1 + dy, color);
                }
            }
        }
    }
}

fn draw_element(canvas: &mut Band<'_>, element: &PrintElement, lane_width: u32, palette: &Palette) {
    let lane_width = lane_width as i64;
    let center_x = |column: usize| column as i64 * lane_width + lane_width / 2;
    let x = center_x(element.column);
    let mid = canvas.height as i64 / 2;
    let bottom = canvas.height as i64 - 1;
    let color = palette.color(element);
    let dashed = element.edge_type == Some(EdgeType::Collapsed);

    match element.kind {
        PrintElementKind::Node => canvas.disc((x, mid), (lane_width / 4).max(2), color),
        PrintElementKind::Segment { direction, other_column } => {
            // Each row draws its half of the edge up to the band edge, halfway between the lanes.
            let edge_x = (x + center_x(other_column)) / 2;
            let edge_y = match direction {
                Direction::Up => 0,
                Direction::Down => bottom,
            };
            canvas.line((x, mid), (edge_x, edge_y), color, dashed);
        }
        PrintElementKind::Arrow { direction } => {
            let (tip, back) = match direction {
                Direction::Up => (1, 4),
                Direction::Down => (bottom - 1, -4),
            };
            canvas.line((x, mid), (x, tip), color, dashed);
            canvas.line((x, tip), (x - 3, tip + back), color, false);
            canvas.line((x, tip), (x + 3, tip + back), color, false);
        }
    }
}

/// Colors per column: a bright shade for nodes and loaded edges, a faded one for
/// edges into history that was not loaded. Selected elements are drawn white.
struct Palette {
    bright: Vec<Rgb<u8>>,
    faded: Vec<Rgb<u8>>,
}

impl Palette {
    fn new(columns: usize) -> Self {
        // Evenly spaced hues, shuffled so neighbouring lanes rarely look alike
        let count = columns.max(1);
        let mut hues: Vec<f32> = (0..count).map(|column| column as f32 * 360.0 / count as f32).collect();
        hues.shuffle(&mut StdRng::seed_from_u64(PALETTE_SEED));

        let shade = |lightness: f32, chroma: f32| -> Vec<Rgb<u8>> {
            hues.iter().map(|&hue| to_rgb(Lch::new(lightness, chroma, hue))).collect()
        };
        Self { bright: shade(70.0, 80.0), faded: shade(40.0, 30.0) }
    }

    fn color(&self, element: &PrintElement) -> Rgb<u8> {
        if element.selected {
            return HIGHLIGHT;
        }
        let shades = match element.edge_type {
            Some(EdgeType::NotLoaded) => &self.faded,
            _ => &self.bright,
        };
        shades[element.column % shades.len()]
    }
}

fn to_rgb(color: Lch) -> Rgb<u8> {
    let srgb: Srgb<f32> = Srgb::from_color(color);
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0) as u8;
    Rgb([channel(srgb.red), channel(srgb.green), channel(srgb.blue)])
}
