/// Tickers suggested on the index page.
pub const EXAMPLE_TICKERS: &[&str] = &["CBA.AX", "BHP.AX", "NAB.AX", "AAPL", "GOOGL", "MSFT", "TSLA"];

/// Sample of large ASX-listed companies.
pub const ASX_TICKERS: &[&str] = &[
    "BHP.AX", "CBA.AX", "CSL.AX", "NAB.AX", "WBC.AX", "ANZ.AX", "WES.AX", "MQG.AX", "FMG.AX",
    "TLS.AX", "WOW.AX", "RIO.AX", "ALL.AX", "GMG.AX", "NST.AX", "SCG.AX", "COL.AX", "TCL.AX",
    "SUN.AX", "QBE.AX", "STO.AX", "WDS.AX", "ORG.AX", "S32.AX", "CPU.AX",
];
