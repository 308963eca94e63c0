pub(crate) mod audio;
pub(crate) mod background;
pub(crate) mod caption;
pub(crate) mod overlay;
