//! The configuration binder.
//!
//! Walks the masking rules in declaration order, builds a selector for
//! each, routes every mask specification (primary, then additionals)
//! through the factory registry, and composes the resulting stages into
//! the pipeline. Directives that need binder-owned state are handled
//! here rather than in a factory: `remove` (appends a delete stage),
//! `fromCache` (binds the named cache), `pipe` and `templateEach`
//! (whole-array masks that must bypass the element-wise mask stage),
//! the rule-level `cache:` and `preserve:` wrappers, and the
//! end-of-pipeline removal of `addTransient` fields.

use std::rc::Rc;

use anyhow::{Context, Result, bail};

use crate::cache::{CacheRegistry, new_shared_cache};
use crate::config::{Definition, MaskSpec, MaskingRule, load_definition};
use crate::masks::{
    CachedMaskEngine, MaskContextFactory, MaskEngine, MaskFactory, PreservingMaskEngine,
    context_factories, from_cache::FromCacheEngine, pipe::PipeEngine,
    template::TemplateEachEngine, value_factories,
};
use crate::pipeline::Pipeline;
use crate::pipeline::stages::{
    DeleteProcessor, MaskContextProcessor, MaskProcessor, MaskWholeProcessor,
};
use crate::selector::PathSelector;

pub struct Binder {
    value_factories: Vec<MaskFactory>,
    context_factories: Vec<MaskContextFactory>,
    base_seed: u64,
}

impl Binder {
    /// A binder over the default factory registry.
    pub fn new(base_seed: u64) -> Self {
        Self::with_factories(value_factories(), context_factories(), base_seed)
    }

    pub fn with_factories(
        value_factories: Vec<MaskFactory>,
        context_factories: Vec<MaskContextFactory>,
        base_seed: u64,
    ) -> Self {
        Self {
            value_factories,
            context_factories,
            base_seed,
        }
    }

    /// Appends one stage per mask specification to `pipeline`, in
    /// declaration order, and returns it together with the caches the
    /// rules referenced.
    pub fn bind(
        &self,
        mut pipeline: Pipeline,
        definition: &Definition,
    ) -> Result<(Pipeline, CacheRegistry)> {
        let mut caches = CacheRegistry::new();
        let mut transients: Vec<PathSelector> = Vec::new();

        for (index, rule) in definition.masking.iter().enumerate() {
            let selector = PathSelector::new(&rule.selector.jsonpath)
                .with_context(|| format!("masking rule #{}", index + 1))?;
            let seed = self.base_seed.wrapping_add(index as u64);
            for spec in std::iter::once(&rule.mask).chain(rule.masks.iter()) {
                pipeline = self.bind_spec(
                    pipeline,
                    rule,
                    spec,
                    &selector,
                    seed,
                    &mut caches,
                    &mut transients,
                )?;
            }
        }

        for selector in transients {
            pipeline = pipeline.process(Box::new(DeleteProcessor::new(selector)));
        }

        tracing::info!(
            "Bound {} masking rule(s), {} cache(s)",
            definition.masking.len(),
            caches.len()
        );
        Ok((pipeline, caches))
    }

    #[allow(clippy::too_many_arguments)]
    fn bind_spec(
        &self,
        pipeline: Pipeline,
        rule: &MaskingRule,
        spec: &MaskSpec,
        selector: &PathSelector,
        seed: u64,
        caches: &mut CacheRegistry,
        transients: &mut Vec<PathSelector>,
    ) -> Result<Pipeline> {
        if spec.remove == Some(true) {
            tracing::debug!("Selector '{}': delete stage", selector.path());
            return Ok(pipeline.process(Box::new(DeleteProcessor::new(selector.clone()))));
        }

        if let Some(name) = &spec.from_cache {
            let cache = Rc::clone(caches.entry(name.clone()).or_insert_with(new_shared_cache));
            let engine = self.wrap(Box::new(FromCacheEngine::new(cache)), rule, caches);
            tracing::debug!("Selector '{}': from-cache '{}'", selector.path(), name);
            return Ok(pipeline.process(Box::new(MaskProcessor::new(selector.clone(), engine))));
        }

        if let Some(pipe) = &spec.pipe {
            let child = match (&pipe.masking, &pipe.definition_file) {
                (Some(rules), _) => Definition {
                    masking: rules.clone(),
                    ..Definition::default()
                },
                (None, Some(file)) => load_definition(file)?,
                (None, None) => bail!(
                    "selector '{}': pipe needs inline masking rules or a definitionFile",
                    selector.path()
                ),
            };
            let engine = PipeEngine::new(
                child,
                pipe.inject_parent.clone(),
                pipe.inject_root.clone(),
                seed,
            );
            // the pipe mask consumes the selected array whole, so it must
            // not go through the element-wise mask stage
            let engine = self.wrap(Box::new(engine), rule, caches);
            tracing::debug!("Selector '{}': pipe stage", selector.path());
            return Ok(
                pipeline.process(Box::new(MaskWholeProcessor::new(selector.clone(), engine)))
            );
        }

        if let Some(config) = &spec.template_each {
            // same contract as pipe: the engine binds item and index per
            // element itself, so the array reaches it intact
            let engine = self.wrap(Box::new(TemplateEachEngine::new(config)), rule, caches);
            tracing::debug!("Selector '{}': template-each stage", selector.path());
            return Ok(
                pipeline.process(Box::new(MaskWholeProcessor::new(selector.clone(), engine)))
            );
        }

        if spec.add_transient.is_some() {
            transients.push(selector.clone());
        }

        let view = MaskingRule {
            selector: rule.selector.clone(),
            mask: spec.clone(),
            masks: Vec::new(),
            cache: rule.cache.clone(),
            preserve: rule.preserve,
        };

        for factory in &self.context_factories {
            if let Some(engine) = factory(&view, seed)? {
                tracing::debug!("Selector '{}': context mask stage", selector.path());
                return Ok(
                    pipeline.process(Box::new(MaskContextProcessor::new(selector.clone(), engine)))
                );
            }
        }

        for factory in &self.value_factories {
            if let Some(engine) = factory(&view, seed)? {
                let engine = self.wrap(engine, rule, caches);
                tracing::debug!("Selector '{}': value mask stage", selector.path());
                return Ok(pipeline.process(Box::new(MaskProcessor::new(selector.clone(), engine))));
            }
        }

        let kinds = spec.populated_kinds();
        if kinds.is_empty() {
            bail!("selector '{}': no mask kind specified", selector.path());
        }
        bail!(
            "selector '{}': unknown mask kind [{}]",
            selector.path(),
            kinds.join(", ")
        )
    }

    /// Applies the rule-level wrappers to a value engine: cache recording
    /// first, then the null/empty preservation bypass outermost so
    /// preserved inputs are neither masked nor recorded.
    fn wrap(
        &self,
        engine: Box<dyn MaskEngine>,
        rule: &MaskingRule,
        caches: &mut CacheRegistry,
    ) -> Box<dyn MaskEngine> {
        let mut engine = engine;
        if let Some(name) = &rule.cache {
            let cache = Rc::clone(caches.entry(name.clone()).or_insert_with(new_shared_cache));
            engine = Box::new(CachedMaskEngine::new(engine, cache));
        }
        if let Some(preserve) = rule.preserve {
            engine = Box::new(PreservingMaskEngine::new(engine, preserve));
        }
        engine
    }
}
