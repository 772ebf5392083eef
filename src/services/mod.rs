pub mod category_tree;
pub mod collation;
pub mod expansion;
pub mod onboarding;
pub mod provisioning;
