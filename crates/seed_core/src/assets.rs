const CLOUDINARY_HOST: &str = "https://res.cloudinary.com";

/// Turns relative asset paths into absolute URLs under one base location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetResolver {
    base: String,
}

impl AssetResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn cloudinary(cloud_name: &str) -> Self {
        Self::new(format!("{CLOUDINARY_HOST}/{cloud_name}"))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `None` means "no asset"; the bare base is never returned.
    pub fn resolve(&self, path: Option<&str>) -> Option<String> {
        match path {
            Some(path) if !path.is_empty() => Some(format!("{}{}", self.base, path)),
            _ => None,
        }
    }
}
