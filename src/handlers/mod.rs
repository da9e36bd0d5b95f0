// Two security tiers: public endpoints need no token, everything under
// /api (except login) passes through the JWT + session middleware first.
pub mod protected;
pub mod public;
