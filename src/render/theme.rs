/// Background and per-class text colors (straight RGBA8).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    /// Canvas background.
    pub background: [u8; 4],
    /// Default text color.
    pub plain: [u8; 4],
    /// Slide title color.
    pub title: [u8; 4],
    keyword: [u8; 4],
    string: [u8; 4],
    escape: [u8; 4],
    number: [u8; 4],
    comment: [u8; 4],
    punctuation: [u8; 4],
    function: [u8; 4],
    ty: [u8; 4],
    property: [u8; 4],
}

impl Theme {
    /// GitHub-dark-like palette.
    pub fn dark() -> Self {
        Self {
            background: [13, 17, 23, 255],
            plain: [230, 237, 243, 255],
            title: [139, 148, 158, 255],
            keyword: [255, 123, 114, 255],
            string: [165, 214, 255, 255],
            escape: [121, 192, 255, 255],
            number: [121, 192, 255, 255],
            comment: [139, 148, 158, 255],
            punctuation: [201, 209, 217, 255],
            function: [210, 168, 255, 255],
            ty: [255, 166, 87, 255],
            property: [126, 231, 135, 255],
        }
    }

    /// Light palette.
    pub fn light() -> Self {
        Self {
            background: [255, 255, 255, 255],
            plain: [36, 41, 47, 255],
            title: [87, 96, 106, 255],
            keyword: [207, 34, 46, 255],
            string: [10, 48, 105, 255],
            escape: [5, 80, 174, 255],
            number: [5, 80, 174, 255],
            comment: [110, 119, 129, 255],
            punctuation: [36, 41, 47, 255],
            function: [130, 80, 223, 255],
            ty: [149, 56, 0, 255],
            property: [17, 99, 41, 255],
        }
    }

    /// Deep blue palette.
    pub fn midnight() -> Self {
        Self {
            background: [15, 23, 42, 255],
            plain: [226, 232, 240, 255],
            title: [148, 163, 184, 255],
            keyword: [244, 114, 182, 255],
            string: [134, 239, 172, 255],
            escape: [253, 224, 71, 255],
            number: [251, 146, 60, 255],
            comment: [100, 116, 139, 255],
            punctuation: [203, 213, 225, 255],
            function: [96, 165, 250, 255],
            ty: [45, 212, 191, 255],
            property: [196, 181, 253, 255],
        }
    }

    /// Look up a theme by name; unknown names fall back to [`Theme::dark`].
    pub fn named(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            "midnight" => Self::midnight(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown background theme, using dark");
                Self::dark()
            }
        }
    }

    /// Color of a highlighter class.
    pub fn color_for(&self, class: &str) -> [u8; 4] {
        match class {
            "keyword" => self.keyword,
            "string" => self.string,
            "escape" => self.escape,
            "number" => self.number,
            "comment" => self.comment,
            "punctuation" => self.punctuation,
            "function" => self.function,
            "type" => self.ty,
            "property" => self.property,
            "title" => self.title,
            _ => self.plain,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/theme.rs"]
mod tests;
