//! G-code generation from the motion stream.

use crate::motion::MotionSink;
use serde::{Deserialize, Serialize};

/// Machine settings for [`GcodeWriter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeOptions {
    /// Normal cutting feed in mm/min.
    pub feed_rate: f64,
    /// Feed used for full-width slotting moves (slot ratio 1.0).
    pub slot_feed_rate: f64,
    /// Feed for vertical plunges.
    pub plunge_rate: f64,
    pub spindle_speed: u32,
    pub tool_diameter: f64,
    /// Height the footer retracts to.
    pub safe_z: f64,
    pub line_numbers: bool,
}

impl Default for GcodeOptions {
    fn default() -> Self {
        Self {
            feed_rate: 600.0,
            slot_feed_rate: 300.0,
            plunge_rate: 150.0,
            spindle_speed: 12000,
            tool_diameter: 6.0,
            safe_z: 5.0,
            line_numbers: false,
        }
    }
}

/// Sink that renders every motion call as a G-code block.
pub struct GcodeWriter {
    options: GcodeOptions,
    body: String,
    line_number: u32,
}

impl GcodeWriter {
    /// Creates a new G-code writer.
    pub fn new(options: GcodeOptions) -> Self {
        Self {
            options,
            body: String::new(),
            line_number: 10,
        }
    }

    pub fn options(&self) -> &GcodeOptions {
        &self.options
    }

    /// Moves emitted so far, without header or footer.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Generates the G-code header.
    pub fn generate_header(&self) -> String {
        let mut gcode = String::new();
        gcode.push_str("; Generated by pocketkit\n");
        gcode.push_str(&format!("; Tool diameter: {:.3}mm\n", self.options.tool_diameter));
        gcode.push_str(&format!("; Feed rate: {:.0} mm/min\n", self.options.feed_rate));
        gcode.push_str(&format!("; Spindle speed: {} RPM\n", self.options.spindle_speed));
        gcode.push('\n');

        gcode.push_str("G90         ; Absolute positioning\n");
        gcode.push_str("G21         ; Millimeter units\n");
        gcode.push_str("G17         ; XY plane\n");
        gcode.push_str(&format!(
            "M3 S{}      ; Spindle on at {} RPM\n",
            self.options.spindle_speed, self.options.spindle_speed
        ));
        gcode.push('\n');
        gcode
    }

    /// Generates the G-code footer.
    pub fn generate_footer(&self) -> String {
        let mut gcode = String::new();
        gcode.push('\n');
        gcode.push_str("M5          ; Spindle off\n");
        gcode.push_str(&format!(
            "G00 Z{:.3}   ; Raise tool to safe height\n",
            self.options.safe_z
        ));
        gcode.push_str("M30         ; End program\n");
        gcode
    }

    /// Complete program: header, moves, footer.
    pub fn finish(self) -> String {
        let mut gcode = self.generate_header();
        gcode.push_str(&self.body);
        gcode.push_str(&self.generate_footer());
        gcode
    }

    fn feed_for(&self, feed_scale: f64) -> f64 {
        let scale = feed_scale.clamp(0.0, 1.0);
        self.options.feed_rate + (self.options.slot_feed_rate - self.options.feed_rate) * scale
    }

    fn push_block(&mut self, words: &str) {
        if self.options.line_numbers {
            self.body.push_str(&format!("N{} ", self.line_number));
            self.line_number += 10;
        }
        self.body.push_str(words);
        self.body.push('\n');
    }

    fn arc(&mut self, cmd: &str, feed_scale: f64, x: f64, y: f64, i: f64, j: f64) {
        let feed = self.feed_for(feed_scale);
        self.push_block(&format!(
            "{} X{:.3} Y{:.3} I{:.3} J{:.3} F{:.0}",
            cmd, x, y, i, j, feed
        ));
    }
}

fn axis_words(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> String {
    [("X", x), ("Y", y), ("Z", z)]
        .iter()
        .filter_map(|(axis, value)| value.map(|v| format!(" {}{:.3}", axis, v)))
        .collect()
}

impl MotionSink for GcodeWriter {
    fn rapid(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let words = axis_words(x, y, z);
        if !words.is_empty() {
            self.push_block(&format!("G00{}", words));
        }
    }

    fn feed(&mut self, feed_scale: f64, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        let words = axis_words(x, y, z);
        if words.is_empty() {
            return;
        }
        let feed = if x.is_none() && y.is_none() {
            self.options.plunge_rate
        } else {
            self.feed_for(feed_scale)
        };
        self.push_block(&format!("G01{} F{:.0}", words, feed));
    }

    fn arc_cw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64) {
        self.arc("G02", feed_scale, x, y, i, j);
    }

    fn arc_ccw(&mut self, feed_scale: f64, x: f64, y: f64, i: f64, j: f64) {
        self.arc("G03", feed_scale, x, y, i, j);
    }
}

impl Default for GcodeWriter {
    fn default() -> Self {
        Self::new(GcodeOptions::default())
    }
}
