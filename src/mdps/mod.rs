pub mod mdp_simulator;
