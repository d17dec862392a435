//! NC Generator
//!
//! Compiles paths and heightmaps into an ordered list of tool-motion
//! instructions and serializes them as G-code.
//!
//! Coordinates are converted from pixels to millimeters with
//! `mm_per_pixel`. Depths are given as positive distances into the stock
//! and emitted as negative Z. The instruction list grows across any number
//! of carve calls; `export` renders it without consuming it.

use crate::sink::{Sink, WriterSink};
use imgcarve_core::{
    ConfigurationError, Heightmap, Instruction, PathCollection, Result, ToolState,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Machine and output parameters for the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Millimeters per source pixel
    pub mm_per_pixel: f64,
    /// Tool bit width in source pixels; sets heightmap row spacing
    pub bit_diameter_pixels: f64,
    /// Height for safe travel between cuts (mm)
    pub safe_height: f64,
    /// Spindle speed (RPM)
    pub spindle_speed: f64,
    /// Feed rate for vertical movement (mm/min)
    pub plunge_rate: f64,
    /// Feed rate for cutting moves (mm/min)
    pub feed_rate: f64,
    /// Rapid travel rate used for time estimates (mm/min)
    pub travel_rate: f64,
    /// Feed moves shorter than this are skipped, except the last of a path (mm)
    pub min_move_distance: f64,
    /// Digits after the decimal point in emitted coordinates
    pub decimal_places: usize,
    /// Emit a comment block describing the job before the preamble
    pub emit_header: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            mm_per_pixel: 0.1,
            bit_diameter_pixels: 2.0,
            safe_height: 1.0,
            spindle_speed: 10000.0,
            plunge_rate: 250.0,
            feed_rate: 750.0,
            travel_rate: 3000.0,
            min_move_distance: 0.0,
            decimal_places: 3,
            emit_header: true,
        }
    }
}

impl MachineConfig {
    /// Check every parameter; values are never clamped
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if !(self.mm_per_pixel.is_finite() && self.mm_per_pixel > 0.0) {
            return Err(ConfigurationError::NonPositiveScale(self.mm_per_pixel));
        }
        if !(self.bit_diameter_pixels.is_finite() && self.bit_diameter_pixels > 0.0) {
            return Err(ConfigurationError::NonPositiveBitDiameter(
                self.bit_diameter_pixels,
            ));
        }

        let positive = [
            ("plunge_rate", self.plunge_rate),
            ("feed_rate", self.feed_rate),
            ("travel_rate", self.travel_rate),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, format!("must be > 0 (got {})", value)));
            }
        }

        let non_negative = [
            ("safe_height", self.safe_height),
            ("spindle_speed", self.spindle_speed),
            ("min_move_distance", self.min_move_distance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(name, format!("must be >= 0 (got {})", value)));
            }
        }

        if self.decimal_places > 6 {
            return Err(invalid(
                "decimal_places",
                format!("must be at most 6 (got {})", self.decimal_places),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        name: name.to_string(),
        reason,
    }
}

fn check_depth(depth: f64) -> std::result::Result<(), ConfigurationError> {
    if !(depth.is_finite() && depth >= 0.0) {
        return Err(ConfigurationError::NegativeDepth(depth));
    }
    Ok(())
}

/// Format a number with fixed decimals, never printing a negative zero
fn format_number(value: f64, places: usize) -> String {
    let text = format!("{:.*}", places, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

/// Instruction compiler and G-code writer
#[derive(Debug, Clone)]
pub struct NcGenerator {
    config: MachineConfig,
    instructions: Vec<Instruction>,
    state: ToolState,
}

impl NcGenerator {
    /// Create a generator with an empty program
    pub fn new(config: MachineConfig) -> Result<Self> {
        config.validate()?;
        let state = ToolState::parked(config.safe_height);
        Ok(Self {
            config,
            instructions: Vec::new(),
            state,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Instructions accumulated so far
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Tool state after the last accumulated instruction
    pub fn tool_state(&self) -> &ToolState {
        &self.state
    }

    /// Drop every accumulated instruction and park the tool
    pub fn clear(&mut self) {
        self.instructions.clear();
        self.state = ToolState::parked(self.config.safe_height);
    }

    /// Append an annotation
    pub fn comment(&mut self, text: impl Into<String>) {
        self.push(Instruction::Comment(text.into()));
    }

    fn push(&mut self, instruction: Instruction) {
        match &instruction {
            Instruction::RapidMove { x, y } => {
                self.state.x = *x;
                self.state.y = *y;
            }
            Instruction::FeedMove { x, y, z } => {
                self.state.x = *x;
                self.state.y = *y;
                self.state.z = *z;
                self.state.active_depth = *z;
            }
            Instruction::SetDepth { z } => {
                self.state.active_depth = *z;
                if self.state.tool_down {
                    self.state.z = *z;
                }
            }
            Instruction::ToolUp => {
                self.state.z = self.config.safe_height;
                self.state.tool_down = false;
            }
            Instruction::ToolDown => {
                self.state.z = self.state.active_depth;
                self.state.tool_down = true;
            }
            Instruction::Comment(_) => {}
        }
        self.instructions.push(instruction);
    }

    /// Retract, travel to `(x, y)` and plunge to `z`
    fn start_stroke(&mut self, x: f64, y: f64, z: f64) {
        self.push(Instruction::ToolUp);
        self.push(Instruction::RapidMove { x, y });
        self.push(Instruction::SetDepth { z });
        self.push(Instruction::ToolDown);
    }

    /// Carve every path at `depth` mm below the surface, in input order
    pub fn carve_paths(&mut self, paths: &PathCollection, depth: f64) -> Result<()> {
        check_depth(depth)?;
        if paths.is_empty() {
            warn!("No paths to carve");
            return Ok(());
        }

        let scale = self.config.mm_per_pixel;
        let min_move_sq = self.config.min_move_distance * self.config.min_move_distance;
        let z = 0.0 - depth;
        let start = self.instructions.len();

        for path in paths {
            let Some(first) = path.first() else {
                continue;
            };
            let (x0, y0) = first.scaled(scale);
            self.start_stroke(x0, y0, z);

            let mut last = (x0, y0);
            let count = path.len();
            for (i, point) in path.points().iter().enumerate().skip(1) {
                let (x, y) = point.scaled(scale);
                let dx = x - last.0;
                let dy = y - last.1;
                let far = dx * dx + dy * dy >= min_move_sq;
                let final_point = i + 1 == count && (x, y) != last;
                if far || final_point {
                    self.push(Instruction::FeedMove { x, y, z });
                    last = (x, y);
                }
            }
        }

        debug!(
            "Carved {} path(s) at depth {:.3} mm: {} instructions",
            paths.len(),
            depth,
            self.instructions.len() - start
        );
        Ok(())
    }

    /// Carve the paths in passes of at most `depth_step` until `depth` is reached
    pub fn carve_paths_multipass(
        &mut self,
        paths: &PathCollection,
        depth: f64,
        depth_step: f64,
    ) -> Result<()> {
        check_depth(depth)?;
        if !(depth_step.is_finite() && depth_step > 0.0) {
            return Err(ConfigurationError::NonPositiveDepthStep(depth_step).into());
        }
        if paths.is_empty() {
            warn!("No paths to carve");
            return Ok(());
        }

        let passes = if depth == 0.0 {
            0
        } else {
            (depth / depth_step - 1e-9).ceil().max(1.0) as usize
        };
        for pass in 1..=passes {
            let pass_depth = if pass == passes {
                depth
            } else {
                depth_step * pass as f64
            };
            self.comment(format!("Pass {} of {}", pass, passes));
            self.carve_paths(paths, pass_depth)?;
        }

        info!(
            "Carved {} path(s) in {} pass(es) to {:.3} mm",
            paths.len(),
            passes,
            depth
        );
        Ok(())
    }

    /// Raster-carve a heightmap, interpolating each sample between the depth bounds.
    ///
    /// Rows are spaced by the bit diameter (at least one pixel) and the last
    /// row is always carved. Runs of equal depth collapse into one feed move.
    pub fn carve_heightmap(
        &mut self,
        heightmap: &Heightmap,
        min_depth: f64,
        max_depth: f64,
        both_directions: bool,
    ) -> Result<()> {
        check_depth(min_depth)?;
        check_depth(max_depth)?;
        if min_depth > max_depth {
            return Err(ConfigurationError::InvertedDepthRange {
                min: min_depth,
                max: max_depth,
            }
            .into());
        }
        if heightmap.is_empty() {
            warn!("Empty heightmap, nothing to carve");
            return Ok(());
        }

        let scale = self.config.mm_per_pixel;
        let step = (self.config.bit_diameter_pixels.floor() as u32).max(1);
        let last_row = heightmap.height() - 1;
        let mut rows: Vec<u32> = (0..heightmap.height()).step_by(step as usize).collect();
        if rows.last() != Some(&last_row) {
            rows.push(last_row);
        }

        let depth_at = |sample: f64| 0.0 - (min_depth + sample * (max_depth - min_depth));
        let start = self.instructions.len();

        for (index, &row_y) in rows.iter().enumerate() {
            let Some(row) = heightmap.row(row_y) else {
                continue;
            };
            let forward = !both_directions || index % 2 == 0;
            let columns: Vec<u32> = if forward {
                (0..heightmap.width()).collect()
            } else {
                (0..heightmap.width()).rev().collect()
            };

            let y = row_y as f64 * scale;
            let x0 = columns[0];
            let mut current_z = depth_at(row[x0 as usize]);

            if both_directions && index > 0 {
                self.push(Instruction::FeedMove {
                    x: x0 as f64 * scale,
                    y,
                    z: current_z,
                });
            } else {
                self.start_stroke(x0 as f64 * scale, y, current_z);
            }

            let mut pending: Option<u32> = None;
            for &column in &columns[1..] {
                let z = depth_at(row[column as usize]);
                if z == current_z {
                    pending = Some(column);
                    continue;
                }
                if let Some(run_end) = pending.take() {
                    self.push(Instruction::FeedMove {
                        x: run_end as f64 * scale,
                        y,
                        z: current_z,
                    });
                }
                self.push(Instruction::FeedMove {
                    x: column as f64 * scale,
                    y,
                    z,
                });
                current_z = z;
            }
            if let Some(run_end) = pending {
                self.push(Instruction::FeedMove {
                    x: run_end as f64 * scale,
                    y,
                    z: current_z,
                });
            }
        }

        info!(
            "Carved {}x{} heightmap in {} row(s) ({:.3}..{:.3} mm): {} instructions",
            heightmap.width(),
            heightmap.height(),
            rows.len(),
            min_depth,
            max_depth,
            self.instructions.len() - start
        );
        Ok(())
    }

    /// Estimated run time of the accumulated program
    pub fn estimate_time(&self) -> Duration {
        let c = &self.config;
        let mut state = ToolState::parked(c.safe_height);
        let mut minutes = 0.0;

        for instruction in &self.instructions {
            match instruction {
                Instruction::RapidMove { x, y } => {
                    minutes += (x - state.x).hypot(y - state.y) / c.travel_rate;
                    state.x = *x;
                    state.y = *y;
                }
                Instruction::FeedMove { x, y, z } => {
                    let planar = (x - state.x).hypot(y - state.y);
                    minutes += planar.hypot(z - state.z) / c.feed_rate;
                    state.x = *x;
                    state.y = *y;
                    state.z = *z;
                    state.active_depth = *z;
                }
                Instruction::SetDepth { z } => {
                    if state.tool_down {
                        minutes += (z - state.z).abs() / c.plunge_rate;
                        state.z = *z;
                    }
                    state.active_depth = *z;
                }
                Instruction::ToolUp => {
                    minutes += (c.safe_height - state.z).abs() / c.travel_rate;
                    state.z = c.safe_height;
                    state.tool_down = false;
                }
                Instruction::ToolDown => {
                    minutes += (state.z - state.active_depth).abs() / c.plunge_rate;
                    state.z = state.active_depth;
                    state.tool_down = true;
                }
                Instruction::Comment(_) => {}
            }
        }
        Duration::from_secs_f64(minutes * 60.0)
    }

    fn num(&self, value: f64) -> String {
        format_number(value, self.config.decimal_places)
    }

    fn header_lines(&self) -> Vec<String> {
        let c = &self.config;
        vec![
            "; ImgCarve NC program".to_string(),
            format!("; Scale: {:.4} mm/px", c.mm_per_pixel),
            format!("; Bit diameter: {:.3} px", c.bit_diameter_pixels),
            format!("; Feed: {:.1} mm/min, plunge: {:.1} mm/min", c.feed_rate, c.plunge_rate),
            format!("; Instructions: {}", self.instructions.len()),
        ]
    }

    /// Render the full program: optional header, preamble, body and postamble
    pub fn render_lines(&self) -> Vec<String> {
        let c = &self.config;
        let safe = self.num(c.safe_height);
        let origin = format!("G0 X{} Y{}", self.num(0.0), self.num(0.0));

        let mut lines = Vec::with_capacity(self.instructions.len() + 16);
        if c.emit_header {
            lines.extend(self.header_lines());
        }
        lines.push("G21".to_string());
        lines.push("G90".to_string());
        lines.push(format!("M3 S{:.0}", c.spindle_speed));
        lines.push(format!("G0 Z{}", safe));
        lines.push(origin.clone());

        let mut tool_down = false;
        let mut active_z = 0.0;
        for instruction in &self.instructions {
            let line = match instruction {
                Instruction::RapidMove { x, y } => {
                    format!("G0 X{} Y{}", self.num(*x), self.num(*y))
                }
                Instruction::FeedMove { x, y, z } => {
                    active_z = *z;
                    format!(
                        "G1 X{} Y{} Z{} F{:.1}",
                        self.num(*x),
                        self.num(*y),
                        self.num(*z),
                        c.feed_rate
                    )
                }
                Instruction::SetDepth { z } => {
                    active_z = *z;
                    if tool_down {
                        format!("G1 Z{} F{:.1}", self.num(*z), c.plunge_rate)
                    } else {
                        format!("; depth Z{}", self.num(*z))
                    }
                }
                Instruction::ToolUp => {
                    tool_down = false;
                    format!("G0 Z{}", safe)
                }
                Instruction::ToolDown => {
                    tool_down = true;
                    format!("G1 Z{} F{:.1}", self.num(active_z), c.plunge_rate)
                }
                Instruction::Comment(text) => {
                    format!("; {}", text.replace(['\r', '\n'], " "))
                }
            };
            lines.push(line);
        }

        lines.push(format!("G0 Z{}", safe));
        lines.push(origin);
        lines.push("M5".to_string());
        lines.push("M30".to_string());
        lines
    }

    /// Write the program to a sink, one line per call, then flush it.
    ///
    /// The accumulated instructions are left untouched, so export can be repeated.
    pub fn export<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let lines = self.render_lines();
        for line in &lines {
            sink.write_line(line)?;
        }
        sink.flush()?;
        debug!("Exported {} line(s)", lines.len());
        Ok(())
    }

    /// Render the program as newline-terminated text
    pub fn to_gcode_string(&self) -> String {
        let mut gcode = String::new();
        for line in self.render_lines() {
            gcode.push_str(&line);
            gcode.push('\n');
        }
        gcode
    }

    /// Write the program to a file, replacing any existing content
    pub fn export_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut sink = WriterSink::new(BufWriter::new(file));
        self.export(&mut sink)?;
        info!(
            "Wrote {} line(s) to {}",
            sink.lines_written(),
            path.as_ref().display()
        );
        Ok(())
    }
}
