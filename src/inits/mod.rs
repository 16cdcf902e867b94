pub(crate) mod randomsample;
pub(crate) mod precomputed;
