use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkyfitError {
    #[error("not enough detections: needed {needed}, got {got}")]
    InsufficientDetections { needed: usize, got: usize },

    #[error("point set too small for registration ({0} points); pass through untransformed")]
    DegeneratePointSet(usize),

    #[error("orbital plane is ill-conditioned; the two smallest singular values are nearly equal")]
    IllConditionedPlane,

    #[error("orbital period could not be determined from the track")]
    UndeterminedPeriod,

    #[error("eccentricity {0} is outside the elliptical domain [0, 1)")]
    InvalidEccentricity(f64),

    #[error("invalid tracking parameter: {0}")]
    InvalidTrackingParameter(String),

    #[error("invalid fit parameter: {0}")]
    InvalidFitParameter(String),

    #[error("flight path is empty")]
    EmptyTrack,
}
