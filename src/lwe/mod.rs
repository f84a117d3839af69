//! LWE side of the attack: instances, the embedding and the baseline estimator

pub mod embedding;
pub mod estimator;
pub mod instance;

pub use embedding::primal_lattice_basis;
pub use estimator::{GsaEstimator, ParameterEstimator, PredictedParameters};
pub use instance::{
    alpha_code, ChallengeDirectory, InstanceSource, LweInstance, LweInstanceParams, SyntheticInstances,
};
