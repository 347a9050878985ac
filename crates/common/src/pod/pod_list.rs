use serde::{Deserialize, Serialize};

use crate::crypto::{Address, PodPassword};
use crate::error::FsError;

/// An owned pod. Its signing identity is derived from the root at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodEntry {
    pub name: String,
    pub index: u32,
}

/// A pod owned by someone else, imported from a share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPod {
    pub name: String,
    pub address: Address,
    pub password: PodPassword,
}

/// The root identity's list of pods.
///
/// On the wire this is an object, `{"pods": [{name, index}], "sharedPods":
/// [..], "lastIndex": n}`, not a bare array of `{name, index}`: shared pods
/// and the index high-water mark are stored with the owned pods. A bare
/// array is still read, as a list with no shared pods.
///
/// Pod passwords are not part of this record; each owned pod's password is
/// kept on its own topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodList {
    #[serde(default)]
    pub pods: Vec<PodEntry>,
    #[serde(default)]
    pub shared_pods: Vec<SharedPod>,
    /// Highest index ever assigned. Indices of deleted pods are not reused,
    /// since reuse would hand a new pod the old pod's identity and data.
    #[serde(default)]
    pub last_index: u32,
}

impl PodList {
    pub fn get(&self, name: &str) -> Option<&PodEntry> {
        self.pods.iter().find(|p| p.name == name)
    }

    pub fn get_shared(&self, name: &str) -> Option<&SharedPod> {
        self.shared_pods.iter().find(|p| p.name == name)
    }

    /// Whether `name` is taken by an owned or a shared pod
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some() || self.get_shared(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty() && self.shared_pods.is_empty()
    }

    /// Register a new owned pod and return its index
    pub(crate) fn push(&mut self, name: &str) -> u32 {
        let index = self.last_index.max(self.pods.iter().map(|p| p.index).max().unwrap_or(0)) + 1;
        self.pods.push(PodEntry {
            name: name.to_string(),
            index,
        });
        self.last_index = index;
        index
    }

    pub(crate) fn remove(&mut self, name: &str) -> bool {
        let before = self.pods.len() + self.shared_pods.len();
        self.pods.retain(|p| p.name != name);
        self.shared_pods.retain(|p| p.name != name);
        before != self.pods.len() + self.shared_pods.len()
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>, FsError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub(crate) fn from_json(data: &[u8]) -> Result<Self, FsError> {
        match serde_json::from_slice(data)? {
            WirePodList::Bare(pods) => Ok(PodList {
                pods,
                ..PodList::default()
            }),
            WirePodList::Full(list) => Ok(list),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePodList {
    Bare(Vec<PodEntry>),
    Full(PodList),
}
