pub(crate) mod fade;
pub(crate) mod motion;
