use crate::context::Context;
use crate::crypto::{Address, PodPassword, Secret, SecretKey, SecretShare};
use crate::error::FsError;
use crate::feed::{LookupAnswer, Topic};

use super::handle::{Owner, Pod};
use super::path::validate_pod_name;
use super::pod_list::{PodList, SharedPod};

/// Topic of the pod list under the root identity
pub const POD_LIST_TOPIC: &str = "podfs/pods";

/// BLAKE3 context for the key protecting the pod list
const POD_LIST_KEY_CONTEXT: &str = "podfs 2024-06-01 pod list encryption v1";

fn password_topic(index: u32) -> Topic {
    Topic::new(&format!("podfs/pod-password/{}", index))
}

/// The pods of one root identity.
///
/// The pod list and the wrapped pod passwords are feeds of the root
/// identity. Each owned pod writes its tree under its own derived identity.
#[derive(Debug, Clone)]
pub struct Pods {
    ctx: Context,
    root: SecretKey,
    list_key: Secret,
}

impl Pods {
    pub fn new(ctx: Context, root: SecretKey) -> Self {
        let list_key = Secret::derive(POD_LIST_KEY_CONTEXT, &root.to_bytes());
        Self {
            ctx,
            root,
            list_key,
        }
    }

    /// Address of the root identity
    pub fn address(&self) -> Address {
        self.root.address()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    async fn load(&self) -> Result<(PodList, Option<LookupAnswer>), FsError> {
        let at = self.ctx.clock().now_millis();
        let answer = self
            .ctx
            .feed()
            .try_lookup(&Topic::new(POD_LIST_TOPIC), &self.address(), at)
            .await?;
        match answer {
            Some(answer) => {
                let list = PodList::from_json(&self.list_key.decrypt(&answer.data)?)?;
                Ok((list, Some(answer)))
            }
            None => Ok((PodList::default(), None)),
        }
    }

    async fn save(&self, list: &PodList, previous: Option<&LookupAnswer>) -> Result<(), FsError> {
        let data = self.list_key.encrypt(&list.to_json()?)?;
        let at = self.ctx.clock().now_millis();
        self.ctx
            .feed()
            .write_next(&Topic::new(POD_LIST_TOPIC), &self.root, previous, &data, at)
            .await?;
        Ok(())
    }

    /// The owned and shared pods. An identity with no pods gets an empty list.
    pub async fn list(&self) -> Result<PodList, FsError> {
        Ok(self.load().await?.0)
    }

    /// Register a new pod and create its root directory.
    ///
    /// The pod list is written first, then the wrapped password, then the
    /// root directory. If a later step fails the pod stays registered and
    /// the error is returned as is.
    pub async fn create(&self, name: &str) -> Result<Pod, FsError> {
        validate_pod_name(name, self.ctx.config().max_pod_name_length)?;

        let (mut list, previous) = self.load().await?;
        if list.contains(name) {
            return Err(FsError::already_exists(format!("pod {}", name)));
        }
        let max_pods = self.ctx.config().max_pods;
        if list.pods.len() >= max_pods {
            return Err(FsError::TooManyPods(max_pods));
        }

        let password = Secret::generate()?;
        let index = list.push(name);
        self.save(&list, previous.as_ref()).await?;
        tracing::info!("Pods::create: registered pod {} at index {}", name, index);

        let identity = self.ctx.keys().derive(&self.root, index);
        let pod = Pod::new(self.ctx.clone(), name, Owner::Owned(identity), password);
        if let Err(e) = self.finish_create(&pod, index).await {
            tracing::warn!(
                "Pods::create: pod {} is registered but could not be initialized: {}",
                name,
                e
            );
            return Err(e);
        }
        Ok(pod)
    }

    async fn finish_create(&self, pod: &Pod, index: u32) -> Result<(), FsError> {
        let share = SecretShare::new(pod.password(), &self.root.public())?;
        let at = self.ctx.clock().now_millis();
        self.ctx
            .feed()
            .update(&password_topic(index), &self.root, share.bytes(), at)
            .await?;
        pod.init_root().await
    }

    /// Unregister an owned or shared pod. Its data is left in the store.
    pub async fn delete(&self, name: &str) -> Result<(), FsError> {
        let (mut list, previous) = self.load().await?;
        if !list.remove(name) {
            return Err(FsError::not_found(format!("pod {}", name)));
        }
        self.save(&list, previous.as_ref()).await?;
        tracing::info!("Pods::delete: removed pod {}", name);
        Ok(())
    }

    /// Open an owned or shared pod by name
    pub async fn open(&self, name: &str) -> Result<Pod, FsError> {
        let (list, _) = self.load().await?;

        if let Some(entry) = list.get(name) {
            let password = self.pod_password(entry.index).await?;
            let identity = self.ctx.keys().derive(&self.root, entry.index);
            tracing::debug!("Pods::open: opened pod {} at index {}", name, entry.index);
            return Ok(Pod::new(
                self.ctx.clone(),
                name,
                Owner::Owned(identity),
                password,
            ));
        }

        if let Some(shared) = list.get_shared(name) {
            tracing::debug!("Pods::open: opened shared pod {} of {}", name, shared.address);
            return Ok(Pod::new(
                self.ctx.clone(),
                name,
                Owner::Shared(shared.address),
                shared.password.clone(),
            ));
        }

        Err(FsError::not_found(format!("pod {}", name)))
    }

    async fn pod_password(&self, index: u32) -> Result<PodPassword, FsError> {
        let at = self.ctx.clock().now_millis();
        let answer = self
            .ctx
            .feed()
            .try_lookup(&password_topic(index), &self.address(), at)
            .await?
            .ok_or_else(|| FsError::not_found(format!("password of pod {}", index)))?;
        let share = SecretShare::try_from(answer.data.as_slice())?;
        Ok(share.recover(&self.root)?)
    }

    /// Register someone else's pod under `name`
    pub(crate) async fn add_shared(&self, shared: SharedPod) -> Result<(), FsError> {
        let (mut list, previous) = self.load().await?;
        if list.contains(&shared.name) {
            return Err(FsError::already_exists(format!("pod {}", shared.name)));
        }
        let name = shared.name.clone();
        list.shared_pods.push(shared);
        self.save(&list, previous.as_ref()).await?;
        tracing::info!("Pods::add_shared: imported shared pod {}", name);
        Ok(())
    }
}
