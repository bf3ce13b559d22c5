//! Длина наибольшей общей подстроки двух строк (DP по символам).

/// Буферы строк DP растут и переиспользуются между вызовами.
#[derive(Debug, Default, Clone)]
pub struct LongestCommonSubstring {
    prev: Vec<usize>,
    curr: Vec<usize>,
    a: Vec<char>,
    b: Vec<char>,
}

impl LongestCommonSubstring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Заранее выделить буферы под строки длиной до `len` символов.
    pub fn with_capacity(len: usize) -> Self {
        let mut s = Self::default();
        s.preallocate(len);
        s
    }

    pub fn preallocate(&mut self, len: usize) {
        if self.prev.len() < len + 1 {
            self.prev.resize(len + 1, 0);
            self.curr.resize(len + 1, 0);
        }
        self.a.reserve(len);
        self.b.reserve(len);
    }

    /// Длина наибольшей общей непрерывной подстроки (в символах).
    pub fn evaluate(&mut self, s1: &str, s2: &str) -> usize {
        self.a.clear();
        self.a.extend(s1.chars());
        self.b.clear();
        self.b.extend(s2.chars());
        let (n, m) = (self.a.len(), self.b.len());
        if n == 0 || m == 0 {
            return 0;
        }
        if self.prev.len() < m + 1 {
            self.prev.resize(m + 1, 0);
            self.curr.resize(m + 1, 0);
        }
        self.prev[..=m].fill(0);

        let mut best = 0;
        for i in 0..n {
            self.curr[0] = 0;
            for j in 0..m {
                self.curr[j + 1] = if self.a[i] == self.b[j] {
                    let v = self.prev[j] + 1;
                    best = best.max(v);
                    v
                } else {
                    0
                };
            }
            std::mem::swap(&mut self.prev, &mut self.curr);
        }
        best
    }
}
