//! Elo and SPRT mathematics.
//!
//! Everything in here is a pure function of the observed game counts. The
//! pentanomial log-likelihood ratio uses the simplified normal approximation
//! rather than the exact multinomial MLE; see
//! <http://hardy.uhasselt.be/Fishtest/support_MLE_multinomial.pdf>.

use statrs::distribution::{ContinuousCDF, Normal};

/// Lower and upper SPRT stopping bounds `(a, b)` for the given type I and
/// type II error probabilities: `a = ln(β/(1−α))`, `b = ln((1−β)/α)`.
pub fn stopping_bounds(alpha: f64, beta: f64) -> (f64, f64) {
    let lower = (beta / (1.0 - alpha)).ln();
    let upper = ((1.0 - beta) / alpha).ln();
    (lower, upper)
}

/// Likely Elo of player 1 with its 95% confidence interval, as
/// `(lower, estimate, upper)`.
///
/// Counts carry a Laplace ½ prior so fresh runs produce finite figures.
pub fn elo(wins: u64, draws: u64, losses: u64) -> (f64, f64, f64) {
    let n = (wins + draws + losses) as f64 + 1.5;

    let w = (wins as f64 + 0.5) / n;
    let d = (draws as f64 + 0.5) / n;
    let l = (losses as f64 + 0.5) / n;

    // empirical mean of the game score
    let mu = w + d / 2.0;

    // standard deviation of the game score
    let sigma = (w * (1.0 - mu).powi(2) + d * (0.5 - mu).powi(2) + l * (0.0 - mu).powi(2)).sqrt()
        / n.sqrt();

    let lower = clamp_elo(mu + phi_inv(0.025) * sigma);
    let upper = clamp_elo(mu + phi_inv(0.975) * sigma);

    (lower, clamp_elo(mu), upper)
}

/// Single ± error figure for an `(lower, estimate, upper)` triple.
pub fn elo_error(lower: f64, estimate: f64, upper: f64) -> f64 {
    (upper - estimate).max(estimate - lower).abs()
}

/// Log-likelihood ratio comparing the Elo hypotheses `elo0` and `elo1`
/// against the observed win/draw/loss counts under a trinomial model.
pub fn sprt_trinomial(wins: u64, draws: u64, losses: u64, elo0: f64, elo1: f64) -> f64 {
    // Dirichlet([0.5, 0.5, 0.5]) prior
    let ws = wins as f64 + 0.5;
    let ds = draws as f64 + 0.5;
    let ls = losses as f64 + 0.5;

    let n = ws + ds + ls;
    let (_elo, dlo) = wdl_to_elo(ws / n, ds / n, ls / n);

    let (w0, d0, l0) = elo_to_wdl(elo0, dlo);
    let (w1, d1, l1) = elo_to_wdl(elo1, dlo);

    ws * (w1 / w0).ln() + ds * (d1 / d0).ln() + ls * (l1 / l0).ln()
}

/// Log-likelihood ratio comparing the Elo hypotheses `elo0` and `elo1`
/// against the observed game-pair counts under a pentanomial model.
///
/// Bin order is player-1-centric: `ll` counts pairs lost twice, `ww` pairs
/// won twice, `dd` both draw-draw and win-loss pairs.
pub fn sprt_pentanomial(ll: u64, ld: u64, dd: u64, wd: u64, ww: u64, elo0: f64, elo1: f64) -> f64 {
    let n = (ll + ld + dd + wd + ww) as f64 + 2.5;

    let ll = (ll as f64 + 0.5) / n;
    let ld = (ld as f64 + 0.5) / n;
    let dd = (dd as f64 + 0.5) / n;
    let wd = (wd as f64 + 0.5) / n;
    let ww = (ww as f64 + 0.5) / n;

    // empirical mean of the pair score
    let mu = ww + 0.75 * wd + 0.5 * dd + 0.25 * ld;

    // standard deviation (times √N) of the pair score
    let r = (ww * (1.0 - mu).powi(2)
        + wd * (0.75 - mu).powi(2)
        + dd * (0.50 - mu).powi(2)
        + ld * (0.25 - mu).powi(2)
        + ll * (0.00 - mu).powi(2))
    .sqrt();

    // the hypothesised Elos as pair-score means
    let mu0 = nelo_to_score(elo0, r);
    let mu1 = nelo_to_score(elo1, r);

    let deviation = |m: f64| {
        ww * (1.0 - m).powi(2)
            + wd * (0.75 - m).powi(2)
            + dd * (0.50 - m).powi(2)
            + ld * (0.25 - m).powi(2)
            + ll * (0.00 - m).powi(2)
    };

    let r0 = deviation(mu0);
    let r1 = deviation(mu1);

    if r0 == 0.0 || r1 == 0.0 {
        return 0.0;
    }

    0.5 * n * (r0 / r1).ln()
}

/// Map a score in (0, 1) to an Elo difference; out-of-range scores clamp
/// to 0 so degenerate runs report "even" instead of ±∞.
pub fn clamp_elo(x: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 {
        0.0
    } else {
        -400.0 * (1.0 / x - 1.0).log10()
    }
}

/// Bayesian Elo (and draw Elo) from win/draw/loss probabilities.
fn wdl_to_elo(w: f64, _d: f64, l: f64) -> (f64, f64) {
    let elo = 200.0 * ((w / l) * ((1.0 - l) / (1.0 - w))).log10();
    let dlo = 200.0 * (((1.0 - l) / l) * ((1.0 - w) / w)).log10();
    (elo, dlo)
}

/// Win/draw/loss probabilities from a bayesian Elo and draw Elo.
fn elo_to_wdl(elo: f64, dlo: f64) -> (f64, f64, f64) {
    let w = 1.0 / (1.0 + 10f64.powf((-elo + dlo) / 400.0)); // win probability sigmoid
    let l = 1.0 / (1.0 + 10f64.powf((elo + dlo) / 400.0)); // loss probability sigmoid
    let d = 1.0 - w - l; // draw probability curve
    (w, d, l)
}

/// Normalized Elo to pair-score mean, scaled by the observed deviation `r`.
fn nelo_to_score(nelo: f64, r: f64) -> f64 {
    nelo * std::f64::consts::SQRT_2 * r / (800.0 / std::f64::consts::LN_10) + 0.5
}

/// Inverse of the standard normal CDF.
fn phi_inv(p: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).expect("standard normal parameters are valid");
    normal.inverse_cdf(p)
}
