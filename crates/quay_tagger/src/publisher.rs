use tracing::{debug, error, info};

use crate::{dto::build::BuildEvent, error::TaggerError, registry::Registry};

/// What happened to a build notification.
#[derive(Debug)]
pub enum PublishOutcome {
    /// Every active image got tagged. Empty if the registry listed nothing active.
    Published(Vec<String>),
    /// The build pushed no tags, there is nothing to look up.
    NoTaggableImage,
    /// The image could not be resolved, nothing was published.
    LookupFailed(TaggerError),
    /// At least one publish call failed. `published` holds the images that did get tagged.
    PublishFailed {
        published: Vec<String>,
        failures: Vec<TaggerError>,
    },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Published(_))
    }
}

/// Resolves the image a build pushed and publishes it under the build's name.
pub struct TagPublisher<R: Registry> {
    registry: R,
}

impl<R: Registry> TagPublisher<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Tag the image built for `event` with `event.build_name`.
    ///
    /// The image is found by looking up the history of the build's first docker
    /// tag. Every binding in that history that is still active gets published,
    /// and a failure to publish one does not stop the others.
    pub async fn publish_build_tag(&self, event: &BuildEvent) -> PublishOutcome {
        let source_tag = match event.primary_tag() {
            Some(tag) => tag,
            None => {
                error!(repository = %event.repository, build = %event.build_id, "build error: {}", TaggerError::NoTaggableImage);
                return PublishOutcome::NoTaggableImage;
            }
        };

        let listing = match self.registry.list_tags(&event.repository, source_tag).await {
            Ok(listing) => listing,
            Err(e) => {
                error!(repository = %event.repository, tag = source_tag, "lookup error: {}", e);
                return PublishOutcome::LookupFailed(e);
            }
        };
        debug!("Found {} history entries for {}:{}", listing.tags.len(), event.repository, source_tag);

        let mut published = Vec::new();
        let mut failures = Vec::new();

        // Quay should only ever have one active binding per tag name, but
        // every one it reports gets the build name.
        for entry in listing.active() {
            let image = &entry.docker_image_id;

            match self.registry.create_tag(&event.repository, &event.build_name, image).await {
                Ok(()) => {
                    info!(repository = %event.repository, tag = %event.build_name, image = %image, "tagged image");
                    published.push(image.clone());
                },
                Err(e) => {
                    error!(repository = %event.repository, tag = %event.build_name, image = %image, "publish error: {}", e);
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            PublishOutcome::Published(published)
        } else {
            PublishOutcome::PublishFailed { published, failures }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::dto::tag::{ImageTagList, TagEntry};

    enum Listing {
        Tags(ImageTagList),
        Unreachable,
        Garbage,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List { repository: String, tag: String },
        Create { repository: String, tag: String, image: String },
    }

    struct MemoryRegistry {
        listing: Listing,
        broken_images: HashSet<String>,
        calls: Mutex<Vec<Call>>,
    }

    /// A real `reqwest::Error`, produced without touching the network.
    fn reqwest_error() -> reqwest::Error {
        reqwest::Client::new().get("not a url").build().unwrap_err()
    }

    impl MemoryRegistry {
        fn new(listing: Listing) -> Self {
            Self {
                listing,
                broken_images: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_entries(entries: &[(&str, Option<i64>)]) -> Self {
            let tags = entries.iter()
                .map(|(image, end_ts)| TagEntry {
                    name: "latest".into(),
                    docker_image_id: image.to_string(),
                    end_ts: *end_ts,
                    ..Default::default()
                })
                .collect();

            Self::new(Listing::Tags(ImageTagList {
                tags,
                ..Default::default()
            }))
        }

        fn breaking(mut self, image: &str) -> Self {
            self.broken_images.insert(image.to_string());
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn created_images(&self) -> Vec<String> {
            self.calls().into_iter()
                .filter_map(|c| match c {
                    Call::Create { image, .. } => Some(image),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl Registry for MemoryRegistry {
        async fn list_tags(&self, repository: &str, tag: &str) -> Result<ImageTagList, TaggerError> {
            self.calls.lock().unwrap().push(Call::List {
                repository: repository.into(),
                tag: tag.into(),
            });

            match &self.listing {
                Listing::Tags(list) => Ok(list.clone()),
                Listing::Unreachable => Err(TaggerError::RegistryUnreachable(reqwest_error())),
                Listing::Garbage => Err(TaggerError::RegistryResponseInvalid(
                    serde_json::from_str::<ImageTagList>("<html>").unwrap_err(),
                )),
            }
        }

        async fn create_tag(&self, repository: &str, tag: &str, image: &str) -> Result<(), TaggerError> {
            self.calls.lock().unwrap().push(Call::Create {
                repository: repository.into(),
                tag: tag.into(),
                image: image.into(),
            });

            if self.broken_images.contains(image) {
                return Err(TaggerError::PublishFailed {
                    tag: tag.into(),
                    image: image.into(),
                    source: reqwest_error(),
                });
            }
            Ok(())
        }
    }

    fn event(tags: &[&str]) -> BuildEvent {
        BuildEvent {
            repository: "org/app".into(),
            build_name: "b42".into(),
            docker_tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn no_tags_means_no_calls() {
        let publisher = TagPublisher::new(MemoryRegistry::with_entries(&[("img", None)]));

        let outcome = publisher.publish_build_tag(&event(&[])).await;
        assert!(matches!(outcome, PublishOutcome::NoTaggableImage));
        assert!(publisher.registry().calls().is_empty());
    }

    #[tokio::test]
    async fn publishes_the_active_binding() {
        let publisher = TagPublisher::new(MemoryRegistry::with_entries(&[
            ("img1", Some(100)),
            ("img2", Some(0)),
        ]));

        let outcome = publisher.publish_build_tag(&event(&["latest", "other"])).await;
        assert!(outcome.is_success());
        assert_eq!(publisher.registry().calls(), vec![
            Call::List { repository: "org/app".into(), tag: "latest".into() },
            Call::Create { repository: "org/app".into(), tag: "b42".into(), image: "img2".into() },
        ]);
    }

    #[tokio::test]
    async fn publishes_every_active_binding_in_order() {
        let publisher = TagPublisher::new(MemoryRegistry::with_entries(&[
            ("img1", None),
            ("img2", Some(7)),
            ("img3", Some(0)),
        ]));

        match publisher.publish_build_tag(&event(&["latest"])).await {
            PublishOutcome::Published(images) => assert_eq!(images, vec!["img1", "img3"]),
            o => panic!("unexpected outcome: {:?}", o),
        }
        assert_eq!(publisher.registry().created_images(), vec!["img1", "img3"]);
    }

    #[tokio::test]
    async fn nothing_active_is_a_no_op() {
        let publisher = TagPublisher::new(MemoryRegistry::with_entries(&[]));

        match publisher.publish_build_tag(&event(&["latest"])).await {
            PublishOutcome::Published(images) => assert!(images.is_empty()),
            o => panic!("unexpected outcome: {:?}", o),
        }
        assert!(publisher.registry().created_images().is_empty());

        let publisher = TagPublisher::new(MemoryRegistry::with_entries(&[("old", Some(3))]));
        assert!(publisher.publish_build_tag(&event(&["latest"])).await.is_success());
        assert!(publisher.registry().created_images().is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_publishes_nothing() {
        for listing in [Listing::Unreachable, Listing::Garbage] {
            let publisher = TagPublisher::new(MemoryRegistry::new(listing));

            let outcome = publisher.publish_build_tag(&event(&["latest"])).await;
            assert!(matches!(
                outcome,
                PublishOutcome::LookupFailed(TaggerError::RegistryUnreachable(_) | TaggerError::RegistryResponseInvalid(_))
            ));
            assert!(publisher.registry().created_images().is_empty());
        }
    }

    #[tokio::test]
    async fn publish_failure_does_not_stop_later_entries() {
        let registry = MemoryRegistry::with_entries(&[
            ("img1", Some(0)),
            ("img2", None),
            ("img3", Some(0)),
        ]).breaking("img1");
        let publisher = TagPublisher::new(registry);

        match publisher.publish_build_tag(&event(&["latest"])).await {
            PublishOutcome::PublishFailed { published, failures } => {
                assert_eq!(published, vec!["img2", "img3"]);
                assert_eq!(failures.len(), 1);
                assert!(matches!(&failures[0], TaggerError::PublishFailed { image, .. } if image == "img1"));
            },
            o => panic!("unexpected outcome: {:?}", o),
        }
        assert_eq!(publisher.registry().created_images(), vec!["img1", "img2", "img3"]);
    }
}
