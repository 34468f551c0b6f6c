//! Method resolution.

use std::sync::Arc;

use crate::interpreter::class::METHOD_MISSING;
use crate::interpreter::method::MethodObject;
use crate::interpreter::object::Object;

impl Object {
    /// Find the method `name` resolves to on this receiver.
    ///
    /// The singleton class is searched first, then the owner class and its
    /// ancestors. The first hit wins.
    pub fn find_method(&self, name: &str) -> Option<Arc<MethodObject>> {
        if let Some(singleton) = self.singleton_class() {
            if let Some(method) = singleton.lookup_method(name) {
                return Some(method);
            }
        }
        self.base().class().lookup_method(name)
    }

    /// Find the method_missing hook: the singleton class's slot, then the
    /// owner class's slot, then, when `search_ancestors` is set, a full
    /// `find_method` for `method_missing` so inherited hooks are honoured.
    pub fn find_method_missing(&self, search_ancestors: bool) -> Option<Arc<MethodObject>> {
        if let Some(singleton) = self.singleton_class() {
            if let Some(hook) = singleton.method_missing_hook() {
                return Some(hook);
            }
        }
        if let Some(hook) = self.base().class().method_missing_hook() {
            return Some(hook);
        }
        if search_ancestors {
            self.find_method(METHOD_MISSING)
        } else {
            None
        }
    }
}
