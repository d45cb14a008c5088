//! Configuration access port trait.

pub trait ConfigPort {
    /// Section names in file order.
    fn sections(&self) -> Vec<String>;
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
