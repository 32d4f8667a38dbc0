use orin_store::{ProfileStore, StoreError, UserProfile};

use crate::disclosures::{extract_disclosures, PROFILE_ATTR_LOCATION, PROFILE_ATTR_NAME};

#[derive(Clone)]
/// Public struct `ProfileUpdater` used across Orin components.
pub struct ProfileUpdater {
    store: ProfileStore,
}

impl ProfileUpdater {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }

    /// Captures disclosures from `text` into the profile for `owner`.
    ///
    /// Persists before returning so a recall question in the same message
    /// already sees the update. Messages without disclosures leave the store
    /// untouched.
    pub fn update(&self, owner: &str, text: &str) -> Result<UserProfile, StoreError> {
        let disclosures = extract_disclosures(text);
        if disclosures.is_empty() {
            return self.store.load(owner);
        }

        self.store.update(owner, move |profile| {
            if let Some(name) = disclosures.name {
                profile.insert(PROFILE_ATTR_NAME.to_string(), name);
            }
            if let Some(location) = disclosures.location {
                profile.insert(PROFILE_ATTR_LOCATION.to_string(), location);
            }
        })
    }

    /// Loads the current profile for `owner`.
    pub fn load(&self, owner: &str) -> Result<UserProfile, StoreError> {
        self.store.load(owner)
    }
}
