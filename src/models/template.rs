//! Template geometry and render settings
//!
//! Only the template fields the layout algorithm reads are modelled here; the
//! visual template schema lives with the template registry in JavaScript.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Axis-aligned rectangle in canvas pixels
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow the rectangle by `pad` on every side
    pub fn inflate(&self, pad: f32) -> Rect {
        Rect {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + pad * 2.0,
            height: self.height + pad * 2.0,
        }
    }

    /// Whether the horizontal band `[top, bottom)` crosses this rectangle
    pub fn overlaps_band(&self, top: f32, bottom: f32) -> bool {
        top < self.bottom() && bottom > self.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Which layout function a template uses
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    /// Headline + body, deterministic line placement
    #[default]
    #[serde(alias = "enhanced")]
    Dual,
    /// Body-only free-flowing text box
    #[serde(alias = "regular")]
    Single,
}

fn default_line_height_ratio() -> f32 {
    1.2
}

fn default_min_line_span() -> f32 {
    120.0
}

/// Template constraints consumed by the layout functions
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateGeometry {
    pub template_id: String,
    #[serde(default)]
    pub template_type: TemplateType,
    /// Full canvas of the slide
    pub canvas: Rect,
    /// Area text lines may occupy
    pub content_rect: Rect,
    /// Clearance kept between text and a placed image
    #[serde(default)]
    pub padding: f32,
    /// Vertical gap between the headline and body blocks
    #[serde(default)]
    pub block_gap: f32,
    #[serde(default = "default_line_height_ratio")]
    pub line_height_ratio: f32,
    /// Narrowest horizontal span a line may be squeezed into beside an image
    #[serde(default = "default_min_line_span")]
    pub min_line_span: f32,
}

impl TemplateGeometry {
    /// Reject geometry the wrapping loop cannot work with
    pub fn validate(&self) -> Result<(), LayoutError> {
        let rect = &self.content_rect;
        if !rect.is_finite() || rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(LayoutError::InvalidGeometry(format!(
                "content rect {}x{} must be positive",
                rect.width, rect.height
            )));
        }
        if !self.line_height_ratio.is_finite() || self.line_height_ratio <= 0.0 {
            return Err(LayoutError::InvalidGeometry(format!(
                "line height ratio {} must be positive",
                self.line_height_ratio
            )));
        }
        if !self.padding.is_finite() || !self.block_gap.is_finite() || !self.min_line_span.is_finite() {
            return Err(LayoutError::InvalidGeometry("non-finite spacing".to_string()));
        }
        Ok(())
    }
}

/// A font face the layout depends on
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub family: String,
    pub weight: u16,
    #[serde(default)]
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, weight: u16, italic: bool) -> Self {
        Self { family: family.into(), weight, italic }
    }
}

/// Project-wide render settings captured with each work item
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    pub headline_font: FontSpec,
    pub body_font: FontSpec,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            headline_font: FontSpec::new("Inter", 700, false),
            body_font: FontSpec::new("Inter", 400, false),
        }
    }
}

impl RenderSettings {
    /// Faces that must be loaded before measuring text
    ///
    /// Includes the bold and italic body faces since style ranges use them.
    pub fn font_specs(&self) -> Vec<FontSpec> {
        let body = &self.body_font;
        let mut specs = vec![
            self.headline_font.clone(),
            body.clone(),
            FontSpec::new(body.family.clone(), 700, false),
            FontSpec::new(body.family.clone(), body.weight, true),
        ];
        specs.sort();
        specs.dedup();
        specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_type_aliases() {
        let t: TemplateType = serde_json::from_str("\"regular\"").unwrap();
        assert_eq!(t, TemplateType::Single);
        let t: TemplateType = serde_json::from_str("\"enhanced\"").unwrap();
        assert_eq!(t, TemplateType::Dual);
    }

    #[test]
    fn test_validate_rejects_empty_content_rect() {
        let template = TemplateGeometry {
            template_id: "t".to_string(),
            template_type: TemplateType::Dual,
            canvas: Rect::new(0.0, 0.0, 1080.0, 1350.0),
            content_rect: Rect::new(0.0, 0.0, 0.0, 100.0),
            padding: 0.0,
            block_gap: 0.0,
            line_height_ratio: 1.2,
            min_line_span: 120.0,
        };
        assert!(matches!(template.validate(), Err(LayoutError::InvalidGeometry(_))));
    }

    #[test]
    fn test_font_specs_dedup() {
        let settings = RenderSettings {
            headline_font: FontSpec::new("Inter", 700, false),
            body_font: FontSpec::new("Inter", 400, false),
        };
        // headline face equals the bold body face
        assert_eq!(settings.font_specs().len(), 3);
    }
}
