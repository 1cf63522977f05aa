// Iteration budget for a single run.
pub struct LoopController {
    max_iterations: u32,
    iterations: u32,
}

impl LoopController {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            iterations: 0,
        }
    }

    /// Claim the next iteration. Returns false once the budget is spent.
    pub fn begin_iteration(&mut self) -> bool {
        if self.iterations >= self.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn remaining(&self) -> u32 {
        self.max_iterations - self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_never_exceeded() {
        let mut ctrl = LoopController::new(3);
        let granted = (0..10).filter(|_| ctrl.begin_iteration()).count();
        assert_eq!(granted, 3);
        assert_eq!(ctrl.iterations(), 3);
        assert_eq!(ctrl.remaining(), 0);
    }

    #[test]
    fn zero_budget_grants_nothing() {
        let mut ctrl = LoopController::new(0);
        assert!(!ctrl.begin_iteration());
        assert_eq!(ctrl.iterations(), 0);
    }
}
