mod handoff;
mod properties;
mod startup;
mod walking_scenario;
