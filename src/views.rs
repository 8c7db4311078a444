//! Coupon views
//!
//! Fixed, named filter configurations. Users store per-view preferences keyed
//! by the view's position in [`VIEWS`], so positions never change and new
//! views are only appended.

use crate::{
    coupons::{Coupon, CouponType, CouponTypeSet},
    filter::CouponFilter,
    sorting::SortMode,
    time::PointInTime,
};

/// Identifies a view by its position in [`VIEWS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViewKind {
    /// Every product coupon
    All,

    /// Every product coupon except menus
    AllWithoutMenu,

    /// One coupon type, narrowed by the caller
    Category,

    /// One coupon type without menus, narrowed by the caller
    CategoryWithoutMenu,

    /// Hidden app coupons
    HiddenAppCouponsOnly,

    /// Vegetarian coupons
    Veggie,

    /// Coupons with meat
    MeatWithoutPlantBased,

    /// A user's favourites
    Favorites,

    /// New coupons
    New,

    /// Loyalty card offers
    Payback,
}

impl ViewKind {
    /// Position in [`VIEWS`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The view definition.
    pub fn view(self) -> &'static CouponView {
        VIEWS
            .iter()
            .find(|view| view.kind == self)
            .unwrap_or(&VIEWS[0])
    }
}

/// A named filter plus presentation hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent presentation hints"
)]
pub struct CouponView {
    /// Identity
    pub kind: ViewKind,

    /// Upper-case identifier
    pub name: &'static str,

    /// Filter, including the default sort mode
    pub filter: CouponFilter,

    /// Prefix veggie/plant-based symbols
    pub include_veggie_symbol: bool,

    /// Prefix favourite symbols
    pub highlight_favorites: bool,

    /// Whether user settings may adjust the filter
    pub allow_modify_filter: bool,
}

impl CouponView {
    const fn new(kind: ViewKind, name: &'static str, filter: CouponFilter) -> Self {
        Self {
            kind,
            name,
            filter,
            include_veggie_symbol: true,
            highlight_favorites: true,
            allow_modify_filter: true,
        }
    }

    /// Position in [`VIEWS`].
    pub const fn index(&self) -> usize {
        self.kind.index()
    }

    /// Default sort mode.
    pub const fn default_sort_mode(&self) -> SortMode {
        self.filter.sort_mode
    }

    /// This view's filter restricted to a single coupon type.
    pub fn filter_for_type(&self, coupon_type: CouponType) -> CouponFilter {
        CouponFilter {
            allowed_types: Some(CouponTypeSet::of(&[coupon_type])),
            ..self.filter
        }
    }

    /// Apply the view with an explicit sort mode.
    pub fn apply<'a>(
        &self,
        coupons: impl IntoIterator<Item = &'a Coupon>,
        sort_mode: SortMode,
        at: &PointInTime,
    ) -> Vec<&'a Coupon> {
        self.filter.apply_sorted_by(coupons, sort_mode, at)
    }
}

const PRODUCTS: CouponFilter = CouponFilter {
    allowed_types: Some(CouponTypeSet::BOT_ALLOWED),
    ..CouponFilter::DEFAULT
};

/// All views, in index order.
pub static VIEWS: [CouponView; 10] = [
    CouponView::new(
        ViewKind::All,
        "ALL",
        CouponFilter {
            sort_mode: SortMode::TypeMenuPrice,
            ..PRODUCTS
        },
    ),
    CouponView::new(
        ViewKind::AllWithoutMenu,
        "ALL_WITHOUT_MENU",
        CouponFilter {
            contains_fries_and_drink: Some(false),
            sort_mode: SortMode::TypeMenuPrice,
            ..PRODUCTS
        },
    ),
    CouponView::new(
        ViewKind::Category,
        "CATEGORY",
        CouponFilter {
            sort_mode: SortMode::MenuPrice,
            ..PRODUCTS
        },
    ),
    CouponView::new(
        ViewKind::CategoryWithoutMenu,
        "CATEGORY_WITHOUT_MENU",
        CouponFilter {
            contains_fries_and_drink: Some(false),
            ..PRODUCTS
        },
    ),
    CouponView::new(
        ViewKind::HiddenAppCouponsOnly,
        "HIDDEN_APP_COUPONS_ONLY",
        CouponFilter {
            allowed_types: Some(CouponTypeSet::of(&[CouponType::App])),
            is_hidden: Some(true),
            ..CouponFilter::DEFAULT
        },
    ),
    CouponView {
        include_veggie_symbol: false,
        ..CouponView::new(
            ViewKind::Veggie,
            "VEGGIE",
            CouponFilter {
                is_veggie: Some(true),
                sort_mode: SortMode::MenuPrice,
                ..PRODUCTS
            },
        )
    },
    CouponView {
        include_veggie_symbol: false,
        ..CouponView::new(
            ViewKind::MeatWithoutPlantBased,
            "MEAT_WITHOUT_PLANT_BASED",
            CouponFilter {
                is_veggie: Some(false),
                is_plant_based: Some(false),
                sort_mode: SortMode::MenuPrice,
                ..PRODUCTS
            },
        )
    },
    CouponView {
        highlight_favorites: false,
        allow_modify_filter: false,
        ..CouponView::new(ViewKind::Favorites, "FAVORITES", CouponFilter::DEFAULT)
    },
    CouponView::new(
        ViewKind::New,
        "NEW",
        CouponFilter {
            is_new: Some(true),
            sort_mode: SortMode::TypeMenuPrice,
            ..PRODUCTS
        },
    ),
    CouponView {
        include_veggie_symbol: false,
        allow_modify_filter: false,
        ..CouponView::new(
            ViewKind::Payback,
            "PAYBACK",
            CouponFilter {
                allowed_types: Some(CouponTypeSet::of(&[CouponType::Payback])),
                sort_mode: SortMode::DiscountDescending,
                ..CouponFilter::DEFAULT
            },
        )
    },
];

/// Look up a view by index.
pub fn view(index: usize) -> Option<&'static CouponView> {
    VIEWS.get(index)
}
