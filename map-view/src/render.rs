//! What the page should look like, as plain data. Hosts turn it into DOM.

/// Id of the loading overlay element.
pub const OVERLAY_ID: &str = "map-loading";

/// Inline CSS declarations of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style(Vec<(&'static str, &'static str)>);

impl Style {
    fn new(declarations: &[(&'static str, &'static str)]) -> Self {
        Self(declarations.to_vec())
    }

    /// Value of the given property, if set.
    pub fn get(&self, property: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| *value)
    }

    /// Formats declarations as a `style` attribute value.
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Loading indicator shown over the page while the library loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayModel {
    /// Element id. The overlay is found and removed by it.
    pub id: &'static str,
    /// Text content.
    pub text: String,
    /// Inline style.
    pub style: Style,
}

impl OverlayModel {
    /// Creates the loading overlay with the given text.
    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            id: OVERLAY_ID,
            text: text.into(),
            style: Style::new(&[
                ("position", "absolute"),
                ("top", "50%"),
                ("left", "50%"),
                ("transform", "translate(-50%, -50%)"),
                ("background", "rgba(255, 255, 255, 0.8)"),
                ("padding", "10px"),
                ("border-radius", "4px"),
            ]),
        }
    }
}

/// Error banner shown above the map container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerModel {
    /// Error text.
    pub text: String,
    /// Inline style.
    pub style: Style,
}

/// What a host has to do with the banner element to match a [`ViewModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerChange<'a> {
    /// Create the banner as the first child of the container.
    Insert(&'a BannerModel),
    /// Update text and style of the existing banner.
    Update(&'a BannerModel),
    /// Remove the existing banner.
    Remove,
    /// Nothing is shown and nothing should be.
    Keep,
}

impl<'a> BannerChange<'a> {
    /// Compares the banner currently on the page with the one in `view`.
    pub fn between(is_shown: bool, view: &'a ViewModel) -> Self {
        match (&view.banner, is_shown) {
            (Some(model), false) => Self::Insert(model),
            (Some(model), true) => Self::Update(model),
            (None, true) => Self::Remove,
            (None, false) => Self::Keep,
        }
    }
}

/// Full view of the map page.
///
/// The container and the mount node are always present, so that the layout does not jump when
/// the banner appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    /// Full viewport container.
    pub container: Style,
    /// Node the map widget is rendered into.
    pub mount_node: Style,
    /// Error banner, if loading failed.
    pub banner: Option<BannerModel>,
}

impl ViewModel {
    /// Creates the view, with a banner if `error` is set.
    pub fn new(error: Option<String>) -> Self {
        Self {
            container: Style::new(&[
                ("position", "relative"),
                ("width", "100%"),
                ("height", "100vh"),
            ]),
            mount_node: Style::new(&[
                ("width", "100%"),
                ("height", "100%"),
                ("background", "#f0f0f0"),
            ]),
            banner: error.map(|text| BannerModel {
                text,
                style: Style::new(&[
                    ("position", "absolute"),
                    ("top", "20px"),
                    ("left", "50%"),
                    ("transform", "translateX(-50%)"),
                    ("background", "#ffeeee"),
                    ("color", "red"),
                    ("padding", "10px"),
                    ("border-radius", "4px"),
                    ("z-index", "100"),
                    ("max-width", "80%"),
                    ("text-align", "center"),
                ]),
            }),
        }
    }
}
