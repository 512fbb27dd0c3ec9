pub mod asset;
pub mod asset_status;
pub mod catalog;
pub mod user;

pub use asset::{AssetDetail, AssetListFilter, AssetPatch, AssetSummary, AssetWithModel, NewAsset};
pub use asset_status::{AssetStatusEntry, AssetTimelineEntry, UserTimelineEntry};
pub use catalog::{AssetModel, Brand};
pub use user::{AssignedAsset, NewUser, User, UserDetails, UserListFilter, UserPatch, UserSummary};
