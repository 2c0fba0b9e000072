//! Plate Pack Common Library
//!
//! 調理指示書の料理名を分類し、袋数を計算するエンジン

pub mod types;
pub mod error;
pub mod master;
pub mod normalize;
pub mod classifier;
pub mod linker;
pub mod rules;
pub mod allocator;
pub mod bags;

pub use types::{
    DishMarks, Meal, MixRiceMaster, ParsedPlateRecord, RawPlateLine, RecordKind, RoleGlyph,
    SoupGroup, SoupMaster, Unit,
};
pub use error::{Error, Result};
pub use master::{Masters, UnitEntry};
pub use classifier::{ClassifyState, DescriptorClassifier};
pub use linker::{Linkage, PlateSheet};
pub use rules::{bag_capacity, bag_count_formula, packaging_role, PackagingRole};
pub use allocator::{fifty_gram_split, DishPortion, FixedOrder, FixedOrderPolicy, PackCount};
pub use bags::{bag_count, compute_bags, compute_bags_with_fixed, mix_rice_needle, PackagingDecision};
