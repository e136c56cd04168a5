mod upload_asset;

pub use upload_asset::UploadAsset;
