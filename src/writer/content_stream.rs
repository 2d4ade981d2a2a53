//! PDF content stream builder.
//!
//! Builds the content stream operators for freshly drawn page content and for
//! placing imported page templates (ISO 32000-1:2008 Sections 8-9).

use crate::error::Result;
use std::io::Write;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Set transformation matrix (cm)
    Transform(f64, f64, f64, f64, f64, f64),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    SetFont(String, f64),
    /// Move text position (Td)
    MoveText(f64, f64),
    /// Show text (Tj) - literal string
    ShowText(String),
    /// Paint a named XObject (Do)
    PaintXObject(String),
}

/// Builder accumulating content stream operations for one page.
#[derive(Debug, Clone, Default)]
pub struct ContentStreamBuilder {
    ops: Vec<ContentStreamOp>,
    in_text: bool,
}

impl ContentStreamBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a text object if one is not already open.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text {
            self.ops.push(ContentStreamOp::BeginText);
            self.in_text = true;
        }
        self
    }

    /// End the current text object, if open.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text {
            self.ops.push(ContentStreamOp::EndText);
            self.in_text = false;
        }
        self
    }

    /// Set font and size for subsequent text.
    pub fn set_font(&mut self, name: &str, size: f64) -> &mut Self {
        self.ops.push(ContentStreamOp::SetFont(name.to_string(), size));
        self
    }

    /// Show text at the given position.
    pub fn text(&mut self, text: &str, x: f64, y: f64) -> &mut Self {
        self.begin_text();
        self.ops.push(ContentStreamOp::MoveText(x, y));
        self.ops.push(ContentStreamOp::ShowText(text.to_string()));
        self
    }

    /// Paint a named form XObject scaled to `width` x `height` at `(x, y)`.
    ///
    /// The scale factors map the form's unit-normalized BBox coordinates onto
    /// the page, so the transform divides the target size by the natural one.
    pub fn paint_template(
        &mut self,
        name: &str,
        x: f64,
        y: f64,
        scale_x: f64,
        scale_y: f64,
    ) -> &mut Self {
        self.end_text();
        self.ops.push(ContentStreamOp::SaveState);
        self.ops
            .push(ContentStreamOp::Transform(scale_x, 0.0, 0.0, scale_y, x, y));
        self.ops.push(ContentStreamOp::PaintXObject(name.to_string()));
        self.ops.push(ContentStreamOp::RestoreState);
        self
    }

    /// Whether any operations were recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Serialize all operations into content stream bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut w = Vec::new();
        let mut in_text = false;
        for op in &self.ops {
            match op {
                ContentStreamOp::SaveState => write!(w, "q")?,
                ContentStreamOp::RestoreState => write!(w, "Q")?,
                ContentStreamOp::Transform(a, b, c, d, e, f) => {
                    write!(
                        w,
                        "{} {} {} {} {} {} cm",
                        real(*a),
                        real(*b),
                        real(*c),
                        real(*d),
                        real(*e),
                        real(*f)
                    )?;
                },
                ContentStreamOp::BeginText => {
                    write!(w, "BT")?;
                    in_text = true;
                },
                ContentStreamOp::EndText => {
                    write!(w, "ET")?;
                    in_text = false;
                },
                ContentStreamOp::SetFont(name, size) => {
                    write!(w, "/{} {} Tf", name, real(*size))?
                },
                ContentStreamOp::MoveText(x, y) => write!(w, "{} {} Td", real(*x), real(*y))?,
                ContentStreamOp::ShowText(text) => {
                    write!(w, "(")?;
                    for byte in text.bytes() {
                        match byte {
                            b'(' => w.extend_from_slice(b"\\("),
                            b')' => w.extend_from_slice(b"\\)"),
                            b'\\' => w.extend_from_slice(b"\\\\"),
                            _ => w.push(byte),
                        }
                    }
                    write!(w, ") Tj")?;
                },
                ContentStreamOp::PaintXObject(name) => write!(w, "/{} Do", name)?,
            }
            writeln!(w)?;
        }
        // Close a dangling text object so the stream is balanced
        if in_text {
            writeln!(w, "ET")?;
        }
        Ok(w)
    }
}

/// Format a real operand, trimming trailing zeros.
fn real(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.4}", value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
