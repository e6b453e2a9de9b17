
#[cfg(test)]
mod invitation_tests;
