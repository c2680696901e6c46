//! Response transformations recorded at fit time.
//!
//! A [`Transformation`] is a forward/inverse function pair evaluated in a
//! context of named values. The context captured when the transformation is
//! defined (for example a Box-Cox lambda) can be overlaid with per-row
//! covariate values; the names a transformation reads from rows are declared
//! up front in `required_covariates`.

use super::boxcox::{boxcox, boxcox_lambda, inv_boxcox};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Named values a transformation is evaluated against.
pub type EvalContext = HashMap<String, f64>;

type ContextFn = Arc<dyn Fn(f64, &EvalContext) -> f64 + Send + Sync>;
type ScalarFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

fn lookup(ctx: &EvalContext, name: &str) -> f64 {
    ctx.get(name).copied().unwrap_or(f64::NAN)
}

/// Forward and inverse functions of a response transformation.
#[derive(Clone)]
pub struct Transformation {
    name: String,
    forward: ContextFn,
    inverse: ContextFn,
    required_covariates: BTreeSet<String>,
    context: EvalContext,
    identity: bool,
}

impl Transformation {
    /// Create a transformation from a forward and inverse function pair.
    pub fn new<F, G>(name: impl Into<String>, forward: F, inverse: G) -> Self
    where
        F: Fn(f64, &EvalContext) -> f64 + Send + Sync + 'static,
        G: Fn(f64, &EvalContext) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            forward: Arc::new(forward),
            inverse: Arc::new(inverse),
            required_covariates: BTreeSet::new(),
            context: EvalContext::new(),
            identity: false,
        }
    }

    /// The untransformed response.
    pub fn identity() -> Self {
        Self {
            identity: true,
            ..Self::new("identity", |x, _| x, |y, _| y)
        }
    }

    /// Natural logarithm.
    pub fn log() -> Self {
        Self::new("log", |x, _| x.ln(), |y, _| y.exp())
    }

    /// `ln(1 + x)`, for non-negative responses containing zeros.
    pub fn log1p() -> Self {
        Self::new("log1p", |x, _| x.ln_1p(), |y, _| y.exp_m1())
    }

    /// Square root.
    pub fn sqrt() -> Self {
        Self::new("sqrt", |x, _| x.sqrt(), |y, _| y * y)
    }

    /// Box-Cox transformation with a fixed lambda.
    pub fn box_cox(lambda: f64) -> Self {
        Self::new(
            "box_cox",
            |x, ctx| boxcox(x, lookup(ctx, "lambda")),
            |y, ctx| inv_boxcox(y, lookup(ctx, "lambda")),
        )
        .with_context("lambda", lambda)
    }

    /// Box-Cox transformation with lambda chosen by maximum likelihood on
    /// `series`.
    pub fn box_cox_auto(series: &[f64]) -> Self {
        Self::box_cox(boxcox_lambda(series))
    }

    /// Division by a constant factor.
    pub fn scale(factor: f64) -> Self {
        Self::new(
            "scale",
            |x, ctx| x / lookup(ctx, "factor"),
            |y, ctx| y * lookup(ctx, "factor"),
        )
        .with_context("factor", factor)
    }

    /// Division by a covariate column, e.g. a per-capita response.
    ///
    /// The inverse needs the covariate's value on every forecast row.
    pub fn per_capita(column: &str) -> Self {
        let fwd = column.to_string();
        let inv = column.to_string();
        Self::new(
            format!("per_capita({column})"),
            move |x, ctx| x / lookup(ctx, &fwd),
            move |y, ctx| y * lookup(ctx, &inv),
        )
        .requires([column])
    }

    /// Declare covariates the functions read from each row.
    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_covariates
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a value to the defining context.
    pub fn with_context(mut self, name: impl Into<String>, value: f64) -> Self {
        self.context.insert(name.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the inverse is a no-op.
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn required_covariates(&self) -> &BTreeSet<String> {
        &self.required_covariates
    }

    /// Values captured when the transformation was defined.
    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// Check if binding needs per-row values.
    pub fn is_row_varying(&self) -> bool {
        !self.required_covariates.is_empty()
    }

    /// Bind to the defining context overlaid with `row`.
    ///
    /// Row values shadow defining-context values of the same name.
    pub fn bind(&self, row: Option<&EvalContext>) -> BoundTransform {
        let mut ctx = self.context.clone();
        if let Some(row) = row {
            ctx.extend(row.iter().map(|(k, v)| (k.clone(), *v)));
        }
        let ctx = Arc::new(ctx);

        let forward: ScalarFn = {
            let f = Arc::clone(&self.forward);
            let ctx = Arc::clone(&ctx);
            Arc::new(move |x: f64| f(x, &ctx))
        };
        let inverse: ScalarFn = {
            let g = Arc::clone(&self.inverse);
            Arc::new(move |y: f64| g(y, &ctx))
        };

        BoundTransform {
            name: self.name.clone(),
            forward,
            inverse,
            identity: self.identity,
        }
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("name", &self.name)
            .field("required_covariates", &self.required_covariates)
            .field("context", &self.context)
            .finish()
    }
}

/// A transformation bound to one evaluation context.
#[derive(Clone)]
pub struct BoundTransform {
    name: String,
    forward: ScalarFn,
    inverse: ScalarFn,
    identity: bool,
}

impl BoundTransform {
    pub fn identity() -> Self {
        Transformation::identity().bind(None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn forward(&self, x: f64) -> f64 {
        (self.forward)(x)
    }

    pub fn inverse(&self, y: f64) -> f64 {
        (self.inverse)(y)
    }

    /// Check if both handles share the same bound functions.
    pub fn same_as(&self, other: &BoundTransform) -> bool {
        Arc::ptr_eq(&self.forward, &other.forward) && Arc::ptr_eq(&self.inverse, &other.inverse)
    }
}

impl fmt::Debug for BoundTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTransform")
            .field("name", &self.name)
            .finish()
    }
}
