//! Presentation hints derived from a category name.
//!
//! The mapping is static and total: every name gets an icon and a color, with
//! a generic label style for names the table does not know.

use serde::{Deserialize, Serialize};

/// Icon shown next to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryIcon {
    Person,
    Work,
    ShoppingCart,
    Favorite,
    Flight,
    Restaurant,
    FitnessCenter,
    School,
    AttachMoney,
    MovieFilter,
    People,
    Business,
    Home,
    Devices,
    Palette,
    Groups,
    Label,
}

impl CategoryIcon {
    /// Icon name as stored in the local category table.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryIcon::Person => "person",
            CategoryIcon::Work => "work",
            CategoryIcon::ShoppingCart => "shopping_cart",
            CategoryIcon::Favorite => "favorite",
            CategoryIcon::Flight => "flight",
            CategoryIcon::Restaurant => "restaurant",
            CategoryIcon::FitnessCenter => "fitness_center",
            CategoryIcon::School => "school",
            CategoryIcon::AttachMoney => "attach_money",
            CategoryIcon::MovieFilter => "movie_filter",
            CategoryIcon::People => "people",
            CategoryIcon::Business => "business",
            CategoryIcon::Home => "home",
            CategoryIcon::Devices => "devices",
            CategoryIcon::Palette => "palette",
            CategoryIcon::Groups => "groups",
            CategoryIcon::Label => "label",
        }
    }
}

/// Icon and color for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStyle {
    pub icon: CategoryIcon,
    /// `#RRGGBB`
    pub color_hex: &'static str,
}

/// Fallback color for unknown names.
pub const DEFAULT_COLOR_HEX: &str = "#3B82F6";

impl CategoryStyle {
    const fn new(icon: CategoryIcon, color_hex: &'static str) -> Self {
        Self { icon, color_hex }
    }

    /// Look up the style for a category name, ignoring case.
    pub fn for_name(name: &str) -> Self {
        use CategoryIcon::*;

        match name.trim().to_lowercase().as_str() {
            "personal" => Self::new(Person, "#10B981"),
            "work" => Self::new(Work, "#2563EB"),
            "shopping" => Self::new(ShoppingCart, "#F59E0B"),
            "health" => Self::new(Favorite, "#EF4444"),
            "travel" | "traveling" => Self::new(Flight, "#0EA5E9"),
            "food" => Self::new(Restaurant, "#F97316"),
            "fitness" => Self::new(FitnessCenter, "#22C55E"),
            "study" | "education" => Self::new(School, "#8B5CF6"),
            "finance" | "money" => Self::new(AttachMoney, "#EAB308"),
            "entertainment" => Self::new(MovieFilter, "#EC4899"),
            "family" => Self::new(People, "#14B8A6"),
            "business" => Self::new(Business, "#334155"),
            "home" => Self::new(Home, "#8B5CF6"),
            "technology" => Self::new(Devices, "#3B82F6"),
            "hobby" => Self::new(Palette, "#EC4899"),
            "social" => Self::new(Groups, "#6366F1"),
            _ => Self::new(Label, DEFAULT_COLOR_HEX),
        }
    }
}
