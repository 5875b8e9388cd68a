//! Path-segment resolution chain
//!
//! An incoming path is split into segments; each segment is offered, in
//! order, to a list of [`SegmentHandler`]s. A handler either resolves the
//! segment into a new current object or reports [`Outcome::NotApplicable`],
//! in which case the next handler is tried. "Not applicable" is a control
//! signal, never an error; a handler that recognizes a segment but finds it
//! invalid aborts resolution immediately. Exhausting the handler list is an
//! explicit not-found, never an empty success.

use std::sync::Arc;

use tracing::debug;

use crate::collection::CollectionInstance;
use crate::context::RequestContext;
use crate::error::Error;
use crate::key::{KeyValue, resolve_key};
use crate::model::{Capability, Entity, Identifier, ResourceModel};
use crate::tokenizer::Tokenizer;

/// One URL segment, pre-split into its name and optional parenthesized key
/// expression, with a peek at the following segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentStep<'a> {
    pub name: &'a str,
    pub key_expr: Option<&'a str>,
    pub next: Option<&'a str>,
}

impl<'a> SegmentStep<'a> {
    /// Split a raw segment like `Widgets(Code=ABC)` into name and key text.
    ///
    /// # Errors
    /// `Error::Syntax` on an unbalanced key expression or trailing input
    /// after the closing parenthesis. Positions are relative to the segment.
    pub fn parse(raw: &'a str, next: Option<&'a str>) -> Result<Self, Error> {
        let Some(open) = raw.find('(') else {
            return Ok(Self {
                name: raw,
                key_expr: None,
                next,
            });
        };
        let mut tok = Tokenizer::new(raw);
        tok.seek(open);
        let key_expr = tok.matching_parenthesis()?;
        if !tok.finished() {
            return Err(Error::Syntax {
                pos: tok.pos(),
                message: "unexpected input after key expression".to_owned(),
            });
        }
        Ok(Self {
            name: &raw[..open],
            key_expr: Some(key_expr),
            next,
        })
    }
}

/// The resolved current object carried from one segment step to the next.
#[derive(Debug)]
pub enum Target {
    /// The service document: the root of the service, listing collections.
    ServiceDocument,
    /// The `$metadata` document endpoint.
    Metadata,
    /// A queryable collection, ready for pagination.
    Collection(CollectionInstance),
    /// One keyed entity, available for further navigation steps.
    Entity { set: Identifier, entity: Entity },
}

/// Tri-state result of offering one segment to one handler.
pub enum Outcome {
    Resolved(Target),
    /// This handler does not own this segment; try the next one.
    NotApplicable,
}

/// One link in the segment resolution chain.
pub trait SegmentHandler: Send + Sync {
    /// Offer a segment to this handler.
    ///
    /// # Errors
    /// A returned error means "handled but invalid" and aborts the whole
    /// resolution; "not mine" must be `Ok(Outcome::NotApplicable)`.
    fn try_resolve(
        &self,
        step: &SegmentStep<'_>,
        prior: Option<&Target>,
        model: &ResourceModel,
        ctx: &RequestContext,
    ) -> Result<Outcome, Error>;
}

/// Resolves well-known document endpoints at the root of a path.
pub struct WellKnownHandler;

impl SegmentHandler for WellKnownHandler {
    fn try_resolve(
        &self,
        step: &SegmentStep<'_>,
        prior: Option<&Target>,
        _model: &ResourceModel,
        _ctx: &RequestContext,
    ) -> Result<Outcome, Error> {
        if prior.is_none() && step.name == "$metadata" && step.key_expr.is_none() {
            return Ok(Outcome::Resolved(Target::Metadata));
        }
        Ok(Outcome::NotApplicable)
    }
}

/// Resolves segments naming a registered collection, with or without a key.
pub struct CollectionHandler;

impl SegmentHandler for CollectionHandler {
    fn try_resolve(
        &self,
        step: &SegmentStep<'_>,
        prior: Option<&Target>,
        model: &ResourceModel,
        ctx: &RequestContext,
    ) -> Result<Outcome, Error> {
        let Some((definition, source)) = model.collection(step.name) else {
            return Ok(Outcome::NotApplicable);
        };
        // A bare collection name can only start a path, never continue one.
        if prior.is_some() {
            return Err(Error::UnsupportedComposition {
                segment: step.name.to_owned(),
            });
        }
        let instance =
            CollectionInstance::bind(Arc::clone(definition), Arc::clone(source), ctx)?;
        let Some(key_expr) = step.key_expr else {
            return Ok(Outcome::Resolved(Target::Collection(instance)));
        };
        if !definition.capabilities().supports(Capability::ReadByKey) {
            return Err(Error::NotImplemented("keyed access"));
        }
        let key = resolve_key(key_expr, instance.definition(), ctx)?;
        let entity = instance
            .read_by_key(&key)?
            .ok_or_else(|| Error::KeyNotFound {
                set: step.name.to_owned(),
                key: key.to_string(),
            })?;
        Ok(Outcome::Resolved(Target::Entity {
            set: definition.name().clone(),
            entity,
        }))
    }
}

/// Resolves navigation-property segments on a previously resolved entity,
/// following the binding's referential constraint into the target
/// collection.
pub struct NavigationHandler;

impl SegmentHandler for NavigationHandler {
    fn try_resolve(
        &self,
        step: &SegmentStep<'_>,
        prior: Option<&Target>,
        model: &ResourceModel,
        _ctx: &RequestContext,
    ) -> Result<Outcome, Error> {
        let Some(Target::Entity { set, entity }) = prior else {
            return Ok(Outcome::NotApplicable);
        };
        let Some((definition, _)) = model.collection(set.as_str()) else {
            return Ok(Outcome::NotApplicable);
        };
        let Some(binding) = definition.navigation(step.name) else {
            return Ok(Outcome::NotApplicable);
        };

        let (target_def, target_source) =
            model
                .collection(binding.target.as_str())
                .ok_or_else(|| {
                    Error::InvalidModel(format!(
                        "navigation target '{}' is not registered",
                        binding.target
                    ))
                })?;
        let referenced = target_def
            .property(&binding.constraint.referenced)
            .ok_or_else(|| {
                Error::InvalidModel(format!(
                    "referential constraint names unknown property '{}'",
                    binding.constraint.referenced
                ))
            })?;
        let local = entity.get(&binding.constraint.local).ok_or_else(|| {
            Error::Source(format!(
                "entity lacks constraint property '{}'",
                binding.constraint.local
            ))
        })?;

        let key = KeyValue {
            property: referenced.clone(),
            value: local.clone(),
        };
        let related = target_source
            .read_by_key(&key)?
            .ok_or_else(|| Error::KeyNotFound {
                set: binding.target.to_string(),
                key: key.to_string(),
            })?;
        Ok(Outcome::Resolved(Target::Entity {
            set: binding.target.clone(),
            entity: related,
        }))
    }
}

/// The resolution driver: owns the ordered handler chain.
pub struct PathResolver {
    handlers: Vec<Box<dyn SegmentHandler>>,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PathResolver {
    /// A resolver with the built-in handler chain: well-known documents,
    /// collections, navigation properties.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(WellKnownHandler),
                Box::new(CollectionHandler),
                Box::new(NavigationHandler),
            ],
        }
    }

    /// Append a custom handler to the end of the chain.
    #[must_use]
    pub fn with_handler(mut self, handler: Box<dyn SegmentHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Resolve a full request path, consuming segments left to right. Each
    /// step's result becomes the input to the next; the final current object
    /// is the resolution result.
    ///
    /// # Errors
    /// `Error::SegmentNotFound` naming the first segment no handler owns;
    /// any "handled but invalid" error from a handler aborts immediately.
    pub fn resolve(
        &self,
        path: &str,
        model: &ResourceModel,
        ctx: &RequestContext,
    ) -> Result<Target, Error> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Ok(Target::ServiceDocument);
        }

        let mut current: Option<Target> = None;
        for (i, raw) in segments.iter().enumerate() {
            let step = SegmentStep::parse(raw, segments.get(i + 1).copied())?;
            debug!(segment = raw, "resolving path segment");

            let mut resolved = None;
            for handler in &self.handlers {
                match handler.try_resolve(&step, current.as_ref(), model, ctx)? {
                    Outcome::Resolved(target) => {
                        resolved = Some(target);
                        break;
                    }
                    Outcome::NotApplicable => {}
                }
            }
            match resolved {
                Some(target) => current = Some(target),
                None => return Err(Error::SegmentNotFound((*raw).to_owned())),
            }
        }
        current.ok_or_else(|| Error::SegmentNotFound(path.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_step_splits_name_and_key() {
        let step = SegmentStep::parse("Widgets(Code=ABC)", Some("Supplier")).unwrap();
        assert_eq!(step.name, "Widgets");
        assert_eq!(step.key_expr, Some("Code=ABC"));
        assert_eq!(step.next, Some("Supplier"));
    }

    #[test]
    fn segment_step_without_key() {
        let step = SegmentStep::parse("Widgets", None).unwrap();
        assert_eq!(step.name, "Widgets");
        assert_eq!(step.key_expr, None);
    }

    #[test]
    fn trailing_input_after_key_is_a_syntax_error() {
        assert!(matches!(
            SegmentStep::parse("Widgets(5)x", None),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn unbalanced_key_is_a_syntax_error() {
        assert!(matches!(
            SegmentStep::parse("Widgets(5", None),
            Err(Error::Syntax { .. })
        ));
    }
}
