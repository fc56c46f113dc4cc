//! Task phrase → topic keyword expansion table
//!
//! Keywords are compared against package topics (raw or normalised) and
//! searched for inside normalised summaries.

pub type TaskKeywords = &'static [(&'static str, &'static [&'static str])];

pub static TASK_KEYWORDS: TaskKeywords = &[
    // Data handling
    ("linelist", &["linelist", "case-data", "data-structures", "structured-data"]),
    ("data cleaning", &["data-cleaning", "cleanepi", "data-validation", "standardize"]),
    ("data import", &["data-import", "readepi", "health-information-systems"]),
    // Epidemiological parameters
    (
        "incubation period",
        &["epiparameter", "probability-distribution", "epidemiological", "delay"],
    ),
    (
        "serial interval",
        &["epiparameter", "probability-distribution", "delay", "transmission"],
    ),
    ("generation time", &["epiparameter", "generation", "transmission", "delay"]),
    ("delay distribution", &["epiparameter", "probability-distribution", "delay"]),
    // Transmission metrics
    ("reproduction number", &["reproduction-number", "transmission", "rt", "r0"]),
    ("Rt", &["reproduction-number", "transmission", "real-time-analysis"]),
    ("R0", &["reproduction-number", "transmission", "epidemic-modelling"]),
    ("superspreading", &["superspreading", "transmission", "individual-level"]),
    ("transmission chains", &["transmission-chain", "epichains", "branching-processes"]),
    // Severity & outcomes
    ("CFR", &["case-fatality-rate", "cfr", "severity", "health-outcomes"]),
    ("case fatality", &["case-fatality-rate", "cfr", "severity", "under-reporting"]),
    ("severity", &["severity", "cfr", "case-fatality-rate", "health-outcomes"]),
    ("IFR", &["infection-fatality", "severity", "under-reporting"]),
    // Incidence & epidemic curves
    ("incidence", &["incidence", "incidence2", "epidemic-curves", "time-series"]),
    (
        "epidemic curve",
        &["incidence", "epidemic-curves", "time-series", "visualization"],
    ),
    // Modelling
    ("epidemic model", &["epidemic-modelling", "epidemic-simulations", "compartmental"]),
    (
        "SIR model",
        &["epidemic-modelling", "compartmental", "sir", "infectious-disease-dynamics"],
    ),
    ("scenario", &["scenario-analysis", "scenario-modelling", "epidemic-simulations"]),
    ("final size", &["finalsize", "epidemic-modelling", "sir"]),
    ("forecast", &["forecasting", "real-time-analysis", "prediction"]),
    // Vaccination & interventions
    (
        "vaccine",
        &["vaccination", "vaccine-effectiveness", "non-pharmaceutical-interventions"],
    ),
    ("vaccine effectiveness", &["vaccine-effectiveness", "vaccineff"]),
    ("NPI", &["non-pharmaceutical-interventions", "interventions"]),
    // Serological
    ("seroprevalence", &["serological-surveys", "serofoi", "antibodies"]),
    ("force of infection", &["serofoi", "force-of-infection", "foi"]),
    // Contact data
    ("contact matrix", &["contact-matrices", "contact-matrix", "social-contacts"]),
    ("contact data", &["contact-matrices", "social-contacts"]),
    // Simulation
    ("simulate", &["epidemic-simulations", "outbreak-simulator", "simulist"]),
    ("simulation", &["epidemic-simulations", "outbreak-simulator", "simulist"]),
];
